//! [`RecordImpl`]: the provider registry and per-interval cache owner for
//! one record kind.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──add/rebuild──▶ Assembled ──set_validity_interval──▶ Valid
//!       │                            ▲                                 │  ▲
//!       │                            │                      invalidate │  │ set_validity_interval
//!       │                            └───────── add/remove/rebuild ─── ▼  │
//!       │                                                            Invalid
//!       └──────────── set_validity_interval (empty provider set) ──▶ Valid
//! ```
//!
//! A record with no providers is assembled trivially: entering an interval
//! from `Uninitialized` makes it `Valid`, and every request then fails
//! with `NoProvider`.
//!
//! Every mutation takes `&mut self`; every read takes `&self`. The borrow
//! checker therefore guarantees that no [`Record`] view or [`Handle`] is
//! alive while providers are swapped or caches are dropped, and that
//! concurrent readers only ever share an immutable registry.
//!
//! [`Handle`]: crate::Handle

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::debug;

use condor_core::{
    CacheIdentifier, ComponentDescription, ConfigError, DataKey, ProxyIndex, RecordKey,
    RegistryError, ResolveError, TransitionId, TypeTag, ValidityInterval,
};
use condor_proxy::{DataProxy, DataSource, ProduceContext};

use crate::config::RecordConfig;
use crate::deferred::DeferredError;
use crate::indices::{IndirectionTable, TransitionRequests};
use crate::record::Record;
use crate::token::Token;

/// Where a record is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RecordState {
    /// No providers registered yet.
    #[default]
    Uninitialized,
    /// Providers registered; no validity interval set since the last
    /// topology change.
    Assembled,
    /// A validity interval is set and requests may be served.
    Valid,
    /// The interval ended; caches are dropped.
    Invalid,
}

impl RecordState {
    /// Lowercase name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Assembled => "assembled",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
        }
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Untyped outcome of resolving one identity.
pub enum Resolution<'a> {
    /// The serving provider's value.
    Found {
        /// Type-erased value; downcast by the caller.
        value: &'a (dyn Any + Send + Sync),
        /// Provenance of the serving provider.
        description: &'a ComponentDescription,
        /// Identity actually served. Differs from the request only under
        /// default-label fallback.
        served: &'a DataKey,
    },
    /// Nothing could be served.
    Failed(DeferredError),
}

impl Resolution<'_> {
    /// Whether a value was found.
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

impl fmt::Debug for Resolution<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found {
                description,
                served,
                ..
            } => f
                .debug_struct("Found")
                .field("description", description)
                .field("served", served)
                .finish_non_exhaustive(),
            Self::Failed(why) => f.debug_tuple("Failed").field(why).finish(),
        }
    }
}

/// Provider registry for one record kind.
pub struct RecordImpl {
    key: RecordKey,
    config: RecordConfig,
    proxies: IndexMap<DataKey, DataProxy>,
    /// Label to every type registered under it, for mismatch diagnostics.
    labels: IndexMap<Arc<str>, SmallVec<[TypeTag; 2]>>,
    transitions: IndexMap<TransitionId, TransitionRequests>,
    interval: ValidityInterval,
    cache_identifier: CacheIdentifier,
    state: RecordState,
}

// Compile-time assertion: a RecordImpl must be shareable with reader threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<RecordImpl>();
};

impl RecordImpl {
    /// An empty record with the default configuration.
    pub fn new(key: RecordKey) -> Self {
        Self::from_parts(key, RecordConfig::default())
    }

    /// An empty record with a validated configuration.
    pub fn with_config(key: RecordKey, config: RecordConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_parts(key, config))
    }

    fn from_parts(key: RecordKey, config: RecordConfig) -> Self {
        Self {
            key,
            config,
            proxies: IndexMap::new(),
            labels: IndexMap::new(),
            transitions: IndexMap::new(),
            interval: ValidityInterval::invalid(),
            cache_identifier: CacheIdentifier::next(),
            state: RecordState::Uninitialized,
        }
    }

    // ── Assembly ────────────────────────────────────────────────

    /// Register one provider under `label`. Its identity is
    /// `(data type, label)`.
    ///
    /// A topology change: every cache is dropped, every indirection table
    /// is rebuilt and the record returns to [`RecordState::Assembled`].
    pub fn add_proxy(
        &mut self,
        label: impl Into<Arc<str>>,
        proxy: DataProxy,
    ) -> Result<DataKey, RegistryError> {
        let key = DataKey::new(proxy.data_type(), label);
        if self.proxies.contains_key(&key) {
            return Err(RegistryError::DuplicateKey {
                record: self.key.clone(),
                key,
            });
        }
        self.proxies.insert(key.clone(), proxy);
        self.topology_changed();
        Ok(key)
    }

    /// Unregister the provider serving `key` and hand it back.
    ///
    /// Tokens already minted for `key` stay valid; they resolve to
    /// `NoProvider` until a provider for the identity is registered again.
    pub fn remove_proxy(&mut self, key: &DataKey) -> Result<DataProxy, RegistryError> {
        let proxy = self
            .proxies
            .shift_remove(key)
            .ok_or_else(|| RegistryError::UnknownKey {
                record: self.key.clone(),
                key: key.clone(),
            })?;
        self.topology_changed();
        Ok(proxy)
    }

    /// Replace the whole provider set.
    ///
    /// On a duplicate identity nothing is changed and the existing
    /// providers stay in place.
    pub fn rebuild<I, L>(&mut self, providers: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = (L, DataProxy)>,
        L: Into<Arc<str>>,
    {
        let mut fresh = IndexMap::new();
        for (label, proxy) in providers {
            let key = DataKey::new(proxy.data_type(), label);
            if fresh.contains_key(&key) {
                return Err(RegistryError::DuplicateKey {
                    record: self.key.clone(),
                    key,
                });
            }
            fresh.insert(key, proxy);
        }
        self.proxies = fresh;
        self.topology_changed();
        Ok(())
    }

    fn topology_changed(&mut self) {
        for proxy in self.proxies.values_mut() {
            proxy.invalidate();
        }

        self.labels.clear();
        for key in self.proxies.keys() {
            self.labels
                .entry(Arc::clone(key.label_arc()))
                .or_default()
                .push(key.type_tag());
        }

        let proxies = &self.proxies;
        let fallback = self.config.default_label_fallback;
        for requests in self.transitions.values_mut() {
            requests.rebuild(|key| resolve_slot(proxies, key, fallback));
        }

        self.interval = ValidityInterval::invalid();
        self.cache_identifier = CacheIdentifier::next();
        self.state = RecordState::Assembled;
        debug!(
            record = %self.key,
            providers = self.proxies.len(),
            transitions = self.transitions.len(),
            cache_identifier = %self.cache_identifier,
            "provider set rebuilt"
        );
    }

    // ── Tokens ──────────────────────────────────────────────────

    /// Declare `transition` without minting a token, so a [`Record`] can be
    /// bound for it.
    pub fn register_transition(&mut self, transition: TransitionId) -> Result<(), RegistryError> {
        self.transition_entry(transition).map(|_| ())
    }

    /// Mint the token under which `transition` will request a `T` labeled
    /// `label`.
    ///
    /// Repeating the same request for the same transition returns an equal
    /// token. Tokens survive every later provider change.
    pub fn consumes<T: Send + Sync + 'static>(
        &mut self,
        transition: TransitionId,
        label: impl Into<Arc<str>>,
    ) -> Result<Token<T>, RegistryError> {
        let key = DataKey::of::<T>(label);
        let record = self.key.clone();
        let proxies = &self.proxies;
        let fallback = self.config.default_label_fallback;

        let requests = Self::entry_in(
            &mut self.transitions,
            &record,
            self.config.max_transitions,
            transition,
        )?;
        let index = requests.mint(key.clone(), |k| resolve_slot(proxies, k, fallback));
        debug!(%record, %transition, data = %key, %index, "token minted");
        Ok(Token::bound(key, transition, index))
    }

    fn transition_entry(
        &mut self,
        transition: TransitionId,
    ) -> Result<&mut TransitionRequests, RegistryError> {
        Self::entry_in(
            &mut self.transitions,
            &self.key,
            self.config.max_transitions,
            transition,
        )
    }

    fn entry_in<'t>(
        transitions: &'t mut IndexMap<TransitionId, TransitionRequests>,
        record: &RecordKey,
        limit: usize,
        transition: TransitionId,
    ) -> Result<&'t mut TransitionRequests, RegistryError> {
        if !transitions.contains_key(&transition) && transitions.len() >= limit {
            return Err(RegistryError::TooManyTransitions {
                record: record.clone(),
                limit,
            });
        }
        Ok(transitions.entry(transition).or_default())
    }

    // ── Interval control ────────────────────────────────────────

    /// Enter a new validity interval.
    ///
    /// If the record is valid and `interval` starts where the current one
    /// starts, it is an extension: caches and the cache identifier are
    /// kept and only the bounds change. Anything else drops every cache
    /// and issues a fresh cache identifier.
    ///
    /// Allowed from every state. From `Uninitialized` the empty provider
    /// set is taken as assembled.
    pub fn set_validity_interval(&mut self, interval: ValidityInterval) -> Result<(), RegistryError> {
        if !interval.is_valid() {
            return Err(RegistryError::InvalidInterval {
                record: self.key.clone(),
            });
        }

        if self.state == RecordState::Valid && interval.is_extension_of(&self.interval) {
            debug!(
                record = %self.key,
                from = %self.interval,
                to = %interval,
                "validity interval extended"
            );
            self.interval = interval;
            return Ok(());
        }

        for proxy in self.proxies.values_mut() {
            proxy.invalidate();
        }
        self.interval = interval;
        self.cache_identifier = CacheIdentifier::next();
        self.state = RecordState::Valid;
        debug!(
            record = %self.key,
            interval = %self.interval,
            cache_identifier = %self.cache_identifier,
            "entered validity interval"
        );
        Ok(())
    }

    /// End the current interval: every cache is dropped and no view can be
    /// bound until a new interval is set.
    pub fn invalidate(&mut self) {
        for proxy in self.proxies.values_mut() {
            proxy.invalidate();
        }
        self.interval = ValidityInterval::invalid();
        if self.state == RecordState::Valid {
            self.state = RecordState::Invalid;
        }
        debug!(record = %self.key, state = %self.state, "record invalidated");
    }

    /// Drop one provider's cache so its next request recomputes. Issues a
    /// fresh cache identifier.
    pub fn reset_proxy(&mut self, key: &DataKey) -> Result<(), RegistryError> {
        let proxy = self
            .proxies
            .get_mut(key)
            .ok_or_else(|| RegistryError::UnknownKey {
                record: self.key.clone(),
                key: key.clone(),
            })?;
        proxy.invalidate();
        self.cache_identifier = CacheIdentifier::next();
        debug!(record = %self.key, data = %key, "provider reset");
        Ok(())
    }

    // ── Resolution ──────────────────────────────────────────────

    /// Bind a read view for `transition`.
    ///
    /// Requires a current validity interval.
    pub fn record(&self, transition: TransitionId) -> Result<Record<'_>, RegistryError> {
        if self.state != RecordState::Valid {
            return Err(RegistryError::NotValid {
                record: self.key.clone(),
                state: self.state.name(),
            });
        }
        let requests =
            self.transitions
                .get(&transition)
                .ok_or_else(|| RegistryError::UnknownTransition {
                    record: self.key.clone(),
                    transition,
                })?;
        Ok(Record::new(self, transition, requests.table()))
    }

    /// Resolve an identity by lookup, materializing on first access.
    ///
    /// A `transient` access leaves the provider's gotten flag untouched.
    pub fn get_implementation(&self, key: &DataKey, transient: bool) -> Resolution<'_> {
        match resolve_slot(&self.proxies, key, self.config.default_label_fallback) {
            Some(slot) => self.get_implementation_at(slot, key, transient),
            None => Resolution::Failed(self.absent(key)),
        }
    }

    /// Resolve through a precomputed provider slot. `requested` is the
    /// identity the caller asked for and names it in failures.
    pub fn get_implementation_at(
        &self,
        slot: ProxyIndex,
        requested: &DataKey,
        transient: bool,
    ) -> Resolution<'_> {
        let Some((served, proxy)) = self.proxies.get_index(slot.as_usize()) else {
            return Resolution::Failed(DeferredError::no_provider(
                self.key.clone(),
                requested.clone(),
            ));
        };
        let ctx = ProduceContext::new(&self.key, served, &self.interval).with_source(self);
        match proxy.get(&ctx, self.config.materialize, transient) {
            Ok(value) => Resolution::Found {
                value,
                description: proxy.description(),
                served,
            },
            Err(cause) => Resolution::Failed(DeferredError::provider_failure(
                self.key.clone(),
                requested.clone(),
                Arc::clone(proxy.shared_description()),
                Arc::clone(cause),
            )),
        }
    }

    /// Failure for an identity with no serving provider: `TypeMismatch`
    /// when the label is registered under another type, `NoProvider`
    /// otherwise.
    pub(crate) fn absent(&self, key: &DataKey) -> DeferredError {
        let registered = self
            .labels
            .get(key.label())
            .and_then(|types| types.iter().find(|t| **t != key.type_tag()).copied());
        match registered {
            Some(registered) => {
                DeferredError::type_mismatch(self.key.clone(), key.clone(), registered)
            }
            None => DeferredError::no_provider(self.key.clone(), key.clone()),
        }
    }

    // ── Introspection ───────────────────────────────────────────

    /// Record kind.
    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    /// Active configuration.
    pub fn config(&self) -> &RecordConfig {
        &self.config
    }

    /// Lifecycle state.
    pub fn state(&self) -> RecordState {
        self.state
    }

    /// Current validity interval; invalid outside [`RecordState::Valid`].
    pub fn validity_interval(&self) -> &ValidityInterval {
        &self.interval
    }

    /// Identifier of the current cache generation.
    pub fn cache_identifier(&self) -> CacheIdentifier {
        self.cache_identifier
    }

    /// Number of registered providers.
    pub fn proxy_count(&self) -> usize {
        self.proxies.len()
    }

    /// Replace `out` with every registered identity, in registration order.
    pub fn fill_registered_data_keys(&self, out: &mut Vec<DataKey>) {
        out.clear();
        out.extend(self.proxies.keys().cloned());
    }

    /// Every registered identity, in registration order.
    pub fn registered_data_keys(&self) -> Vec<DataKey> {
        self.proxies.keys().cloned().collect()
    }

    /// The provider registered under exactly `key`.
    pub fn find(&self, key: &DataKey) -> Option<&DataProxy> {
        self.proxies.get(key)
    }

    /// Whether the provider for exactly `key` was read non-transiently
    /// since it was last invalidated.
    pub fn was_gotten(&self, key: &DataKey) -> bool {
        self.proxies.get(key).is_some_and(DataProxy::was_gotten)
    }

    /// Which module would serve `key`, without materializing anything.
    pub fn provider_description(&self, key: &DataKey) -> Option<&ComponentDescription> {
        resolve_slot(&self.proxies, key, self.config.default_label_fallback)
            .and_then(|slot| self.proxies.get_index(slot.as_usize()))
            .map(|(_, proxy)| proxy.description())
    }

    /// Whether the provider for exactly `key` holds a cached outcome.
    pub fn is_cached(&self, key: &DataKey) -> bool {
        self.proxies.get(key).is_some_and(DataProxy::is_cached)
    }

    /// Producer invocations for exactly `key` over the provider's lifetime.
    pub fn materialization_count(&self, key: &DataKey) -> Option<u64> {
        self.proxies.get(key).map(DataProxy::materialization_count)
    }

    /// The current indirection table of `transition`.
    pub fn indirection_table(&self, transition: TransitionId) -> Option<&IndirectionTable> {
        self.transitions.get(&transition).map(TransitionRequests::table)
    }

    /// Every transition that has been registered, in registration order.
    pub fn transitions(&self) -> impl Iterator<Item = TransitionId> + '_ {
        self.transitions.keys().copied()
    }
}

/// Producers read their inputs from the record that owns them.
impl DataSource for RecordImpl {
    fn lookup(&self, key: &DataKey) -> Result<&(dyn Any + Send + Sync), ResolveError> {
        match self.get_implementation(key, false) {
            Resolution::Found { value, .. } => Ok(value),
            Resolution::Failed(why) => Err(why.raise()),
        }
    }
}

impl fmt::Debug for RecordImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordImpl")
            .field("key", &self.key)
            .field("state", &self.state)
            .field("interval", &self.interval)
            .field("cache_identifier", &self.cache_identifier)
            .field("providers", &self.proxies.len())
            .field("transitions", &self.transitions.len())
            .finish()
    }
}

/// Provider slot serving `key`, if any.
///
/// With `fallback`, an unlabeled request is served by the sole provider of
/// its type when no unlabeled provider exists.
fn resolve_slot(
    proxies: &IndexMap<DataKey, DataProxy>,
    key: &DataKey,
    fallback: bool,
) -> Option<ProxyIndex> {
    if let Some(position) = proxies.get_index_of(key) {
        return Some(ProxyIndex(position as u32));
    }
    if fallback && key.label().is_empty() {
        let mut candidates = proxies
            .keys()
            .enumerate()
            .filter(|(_, k)| k.type_tag() == key.type_tag());
        if let (Some((position, _)), None) = (candidates.next(), candidates.next()) {
            return Some(ProxyIndex(position as u32));
        }
    }
    None
}
