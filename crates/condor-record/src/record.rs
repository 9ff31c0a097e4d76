//! [`Record`]: a consumer's read view of a [`RecordImpl`].
//!
//! A record is bound to one transition and to that transition's current
//! indirection table. It is `Copy`, holds only references, and is shared
//! freely across reader threads. Because it borrows the [`RecordImpl`], no
//! provider or cache mutation can happen while any view is alive.
//!
//! Two request paths are offered:
//!
//! - **Tokens** ([`get`](Record::get)): a table read, then the provider's
//!   cache. No hashing.
//! - **Labels and tags** ([`get_by_label`](Record::get_by_label),
//!   [`get_by_tag`](Record::get_by_tag)): a lookup by identity. The tagged
//!   path also checks that the serving module is the one requested.

use std::fmt;

use condor_core::{
    CacheIdentifier, ComponentDescription, DataKey, InputTag, RecordKey, ResolveError,
    TransitionId, ValidityInterval,
};
use condor_proxy::DataProxy;

use crate::deferred::{DeferredError, TokenFault};
use crate::handle::Handle;
use crate::indices::{IndirectionTable, SlotLookup};
use crate::record_impl::{RecordImpl, Resolution};
use crate::token::Token;

/// Read view of one record for one transition.
#[derive(Clone, Copy)]
pub struct Record<'a> {
    imp: &'a RecordImpl,
    transition: TransitionId,
    table: &'a IndirectionTable,
}

impl<'a> Record<'a> {
    /// Bind a view. Normally obtained through
    /// [`RecordImpl::record`](crate::RecordImpl::record), which also checks
    /// the record has a current interval.
    pub fn new(imp: &'a RecordImpl, transition: TransitionId, table: &'a IndirectionTable) -> Self {
        Self {
            imp,
            transition,
            table,
        }
    }

    /// Rebind this view to another record, transition or table.
    pub fn set_impl(
        &mut self,
        imp: &'a RecordImpl,
        transition: TransitionId,
        table: &'a IndirectionTable,
    ) {
        *self = Self::new(imp, transition, table);
    }

    /// Record kind.
    pub fn key(&self) -> &'a RecordKey {
        self.imp.key()
    }

    /// Transition this view serves.
    pub fn transition(&self) -> TransitionId {
        self.transition
    }

    /// Interval the cached values belong to.
    pub fn validity_interval(&self) -> &'a ValidityInterval {
        self.imp.validity_interval()
    }

    /// Identifier of the current cache generation.
    pub fn cache_identifier(&self) -> CacheIdentifier {
        self.imp.cache_identifier()
    }

    /// Request the datum named by `token`.
    ///
    /// Never fails eagerly: absence, producer failure and invalid tokens
    /// all come back as a failed [`Handle`]. With
    /// [`strict_tokens`](crate::RecordConfig::strict_tokens) an invalid
    /// token panics instead.
    pub fn get<T: 'static>(&self, token: &Token<T>) -> Handle<'a, T> {
        self.resolve_token(token, false)
    }

    /// Like [`get`](Self::get) but does not mark the provider as gotten.
    pub fn get_transient<T: 'static>(&self, token: &Token<T>) -> Handle<'a, T> {
        self.resolve_token(token, true)
    }

    fn resolve_token<T: 'static>(&self, token: &Token<T>, transient: bool) -> Handle<'a, T> {
        let (Some(minted), Some(index)) = (token.transition(), token.index()) else {
            return self.invalid_token(token, TokenFault::Uninitialized);
        };
        if minted != self.transition {
            return self.invalid_token(
                token,
                TokenFault::WrongTransition {
                    minted,
                    bound: self.transition,
                },
            );
        }
        match self.table.lookup(index) {
            SlotLookup::Provider(slot) => {
                let resolution = self.imp.get_implementation_at(slot, token.key(), transient);
                self.typed(resolution, token.key())
            }
            SlotLookup::NoProvider => Handle::failed(self.imp.absent(token.key())),
            SlotLookup::OutOfRange => self.invalid_token(token, TokenFault::OutOfRange(index)),
        }
    }

    fn invalid_token<T: 'static>(&self, token: &Token<T>, fault: TokenFault) -> Handle<'a, T> {
        if self.imp.config().strict_tokens {
            panic!(
                "invalid token for {} in record {}: {fault}",
                token.key(),
                self.key()
            );
        }
        Handle::failed(DeferredError::invalid_token(
            self.key().clone(),
            token.type_tag(),
            fault,
        ))
    }

    fn typed<T: 'static>(&self, resolution: Resolution<'a>, requested: &DataKey) -> Handle<'a, T> {
        match resolution {
            Resolution::Found {
                value,
                description,
                served,
            } => match value.downcast_ref::<T>() {
                Some(value) => Handle::valid(value, description),
                None => Handle::failed(DeferredError::type_mismatch(
                    self.key().clone(),
                    requested.clone(),
                    served.type_tag(),
                )),
            },
            Resolution::Failed(why) => Handle::failed(why),
        }
    }

    /// Request a `T` by label.
    pub fn get_by_label<T: 'static>(&self, label: &str) -> Handle<'a, T> {
        let key = DataKey::of::<T>(label);
        let resolution = self.imp.get_implementation(&key, false);
        self.typed(resolution, &key)
    }

    /// Request the unlabeled `T`.
    pub fn get_unlabeled<T: 'static>(&self) -> Handle<'a, T> {
        self.get_by_label("")
    }

    /// Request a `T` by input tag.
    ///
    /// When the tag names a module, the serving provider's module must
    /// match it: its label, or its type when the module is unlabeled. A
    /// mismatch is returned immediately as [`ResolveError::ModuleMismatch`]
    /// and nothing is materialized. Absence, type mismatch and producer
    /// failure are deferred as usual.
    pub fn get_by_tag<T: 'static>(&self, tag: &InputTag) -> Result<Handle<'a, T>, ResolveError> {
        let key = DataKey::of::<T>(tag.data.as_str());
        if let Some(description) = self.imp.provider_description(&key) {
            self.validate(tag, &key, description)?;
        }
        let resolution = self.imp.get_implementation(&key, false);
        Ok(self.typed(resolution, &key))
    }

    fn validate(
        &self,
        tag: &InputTag,
        requested: &DataKey,
        description: &ComponentDescription,
    ) -> Result<(), ResolveError> {
        let served = description.display_label();
        if !tag.module.is_empty() && tag.module != served {
            return Err(ResolveError::ModuleMismatch {
                record: self.key().clone(),
                key: requested.clone(),
                requested: tag.module.clone(),
                served: served.to_string(),
            });
        }
        Ok(())
    }

    /// Force resolution of `key` and report whether a value is available.
    pub fn do_get(&self, key: &DataKey, transient: bool) -> bool {
        self.imp.get_implementation(key, transient).is_found()
    }

    /// Whether the provider for exactly `key` has been read
    /// non-transiently in this interval.
    pub fn was_gotten(&self, key: &DataKey) -> bool {
        self.imp.was_gotten(key)
    }

    /// Which module would serve `key`.
    pub fn provider_description(&self, key: &DataKey) -> Option<&'a ComponentDescription> {
        self.imp.provider_description(key)
    }

    /// Replace `out` with every registered identity.
    pub fn fill_registered_data_keys(&self, out: &mut Vec<DataKey>) {
        self.imp.fill_registered_data_keys(out);
    }

    /// The provider registered under exactly `key`.
    pub fn find(&self, key: &DataKey) -> Option<&'a DataProxy> {
        self.imp.find(key)
    }
}

impl fmt::Debug for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("key", self.key())
            .field("transition", &self.transition)
            .field("interval", self.validity_interval())
            .field("cache_identifier", &self.cache_identifier())
            .finish()
    }
}

// Compile-time assertion: a Record view must be shareable across reader threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Record<'static>>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordConfig;
    use condor_core::{ComponentDescription, SyncValue};
    use condor_proxy::from_fn;

    fn lenient() -> RecordConfig {
        RecordConfig {
            strict_tokens: false,
            ..RecordConfig::default()
        }
    }

    fn assembled() -> RecordImpl {
        let mut r = RecordImpl::with_config(RecordKey::new("Calib"), lenient()).unwrap();
        r.add_proxy(
            "",
            DataProxy::new(ComponentDescription::new("Const", "constA"), from_fn(|_| Ok(42_i32))),
        )
        .unwrap();
        r.register_transition(TransitionId(0)).unwrap();
        r.register_transition(TransitionId(1)).unwrap();
        r.set_validity_interval(ValidityInterval::open_ended(SyncValue(1)))
            .unwrap();
        r
    }

    #[test]
    fn token_from_other_transition_is_invalid() {
        let mut r = assembled();
        let token = r.consumes::<i32>(TransitionId(1), "").unwrap();
        let record = r.record(TransitionId(0)).unwrap();
        let h = record.get(&token);
        assert!(!h.is_valid());
        assert!(matches!(h.get(), Err(ResolveError::InvalidToken { .. })));
    }

    #[test]
    fn uninitialized_token_is_invalid() {
        let r = assembled();
        let record = r.record(TransitionId(0)).unwrap();
        let h = record.get(&Token::<i32>::uninitialized(""));
        assert!(matches!(
            h.get(),
            Err(ResolveError::InvalidToken { detail, .. }) if detail == "token was never minted"
        ));
    }

    #[test]
    fn token_outside_table_is_invalid() {
        let mut r = assembled();
        let token = r.consumes::<i32>(TransitionId(0), "").unwrap();
        let empty = IndirectionTable::default();
        let record = Record::new(&r, TransitionId(0), &empty);
        assert!(matches!(
            record.get(&token).get(),
            Err(ResolveError::InvalidToken { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "invalid token")]
    fn strict_mode_panics_on_invalid_token() {
        let config = RecordConfig {
            strict_tokens: true,
            ..RecordConfig::default()
        };
        let mut r = RecordImpl::with_config(RecordKey::new("R"), config).unwrap();
        r.register_transition(TransitionId(0)).unwrap();
        r.set_validity_interval(ValidityInterval::open_ended(SyncValue(0)))
            .unwrap();
        let record = r.record(TransitionId(0)).unwrap();
        let _ = record.get(&Token::<i32>::uninitialized(""));
    }

    #[test]
    fn label_and_tag_paths() {
        let r = assembled();
        let record = r.record(TransitionId(0)).unwrap();
        assert_eq!(record.get_unlabeled::<i32>().get(), Ok(&42));
        assert!(record.get_by_label::<i32>("x").get().is_err());

        let h = record.get_by_tag::<i32>(&InputTag::new("constA", "")).unwrap();
        assert_eq!(h.ok(), Some(&42));
        let h = record.get_by_tag::<i32>(&InputTag::data("")).unwrap();
        assert_eq!(h.ok(), Some(&42));

        let err = record
            .get_by_tag::<i32>(&InputTag::new("constB", ""))
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::ModuleMismatch {
                record: RecordKey::new("Calib"),
                key: DataKey::unlabeled::<i32>(),
                requested: "constB".into(),
                served: "constA".into(),
            }
        );
    }

    #[test]
    fn unlabeled_module_is_matched_by_type() {
        let mut r = RecordImpl::with_config(RecordKey::new("Calib"), lenient()).unwrap();
        r.add_proxy(
            "",
            DataProxy::new(ComponentDescription::new("PedestalProducer", ""), from_fn(|_| Ok(3_i32))),
        )
        .unwrap();
        r.register_transition(TransitionId(0)).unwrap();
        r.set_validity_interval(ValidityInterval::open_ended(SyncValue(1)))
            .unwrap();
        let record = r.record(TransitionId(0)).unwrap();

        let h = record
            .get_by_tag::<i32>(&InputTag::new("PedestalProducer", ""))
            .unwrap();
        assert_eq!(h.get(), Ok(&3));

        let err = record
            .get_by_tag::<i32>(&InputTag::new("GainProducer", ""))
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::ModuleMismatch { served, .. } if served == "PedestalProducer"
        ));
    }

    #[test]
    fn module_mismatch_does_not_materialize() {
        let r = assembled();
        let record = r.record(TransitionId(0)).unwrap();
        let key = DataKey::unlabeled::<i32>();
        assert!(record.get_by_tag::<i32>(&InputTag::new("constB", "")).is_err());
        assert!(!r.is_cached(&key));
        assert!(!record.was_gotten(&key));
    }

    #[test]
    fn tagged_type_mismatch_is_deferred() {
        let r = assembled();
        let record = r.record(TransitionId(0)).unwrap();
        let h = record.get_by_tag::<u8>(&InputTag::data("")).unwrap();
        assert!(!h.is_valid());
        assert!(matches!(
            h.get(),
            Err(ResolveError::TypeMismatch { registered, .. }) if registered.is::<i32>()
        ));
    }

    #[test]
    fn rebinding_switches_transition() {
        let mut r = assembled();
        let token = r.consumes::<i32>(TransitionId(1), "").unwrap();
        let mut record = r.record(TransitionId(0)).unwrap();
        assert!(!record.get(&token).is_valid());

        let table = r.indirection_table(TransitionId(1)).unwrap();
        record.set_impl(&r, TransitionId(1), table);
        assert_eq!(record.transition(), TransitionId(1));
        assert_eq!(record.get(&token).get(), Ok(&42));
    }

    #[test]
    fn do_get_and_introspection() {
        let r = assembled();
        let record = r.record(TransitionId(0)).unwrap();
        let key = DataKey::unlabeled::<i32>();
        assert!(!record.was_gotten(&key));
        assert!(record.do_get(&key, true));
        assert!(!record.was_gotten(&key));
        assert!(record.do_get(&key, false));
        assert!(record.was_gotten(&key));
        assert!(!record.do_get(&DataKey::unlabeled::<u8>(), false));

        assert_eq!(
            record.provider_description(&key).map(|d| d.label.as_str()),
            Some("constA")
        );
        let mut keys = Vec::new();
        record.fill_registered_data_keys(&mut keys);
        assert_eq!(keys, vec![key.clone()]);
        assert!(record.find(&key).is_some());
        assert!(format!("{record:?}").contains("Calib"));
    }
}
