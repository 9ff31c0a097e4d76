//! [`DataProxy`]: one provider slot with a publish-once cache.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use condor_core::{ComponentDescription, ProducerError, TypeTag};
use tracing::{trace, warn};

use crate::policy::MaterializePolicy;
use crate::producer::{ErasedProduce, Produce, ProduceContext};

/// A materialized datum behind a type-erased box.
pub type ErasedValue = Box<dyn Any + Send + Sync>;

/// Outcome cached for one interval: the value or the producer's failure.
/// The failure is shared so deferred errors can capture it without a copy.
type Materialized = Result<ErasedValue, Arc<ProducerError>>;

/// A provider slot: producer logic plus at most one cached outcome.
///
/// Lifecycle: registered when the record is assembled, materialized
/// lazily on first access, cleared by [`invalidate`](Self::invalidate) at
/// interval boundaries (the registration survives), and dropped only when
/// the record's provider set is rebuilt.
///
/// Reads go through `&self` and may race; clearing requires `&mut self`,
/// so it can never overlap a read.
pub struct DataProxy {
    description: Arc<ComponentDescription>,
    producer: Box<dyn ErasedProduce>,
    cache: OnceLock<Materialized>,
    /// Set on the first successful, non-transient access this interval.
    gotten: AtomicBool,
    /// Producer invocations since registration, for diagnostics.
    materializations: AtomicU64,
}

// Compile-time assertion: DataProxy must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<DataProxy>();
};

impl DataProxy {
    /// Register `producer` as served by the module `description`.
    pub fn new<P: Produce>(description: ComponentDescription, producer: P) -> Self {
        Self::with_shared_description(Arc::new(description), producer)
    }

    /// Like [`new`](Self::new), sharing one description among the several
    /// proxies a module provides.
    pub fn with_shared_description<P: Produce>(
        description: Arc<ComponentDescription>,
        producer: P,
    ) -> Self {
        Self {
            description,
            producer: Box::new(producer),
            cache: OnceLock::new(),
            gotten: AtomicBool::new(false),
            materializations: AtomicU64::new(0),
        }
    }

    /// Type of the datum this proxy serves.
    pub fn data_type(&self) -> TypeTag {
        self.producer.output_type()
    }

    /// Module that serves the datum.
    pub fn description(&self) -> &ComponentDescription {
        &self.description
    }

    /// Shared handle to the serving module's description.
    pub fn shared_description(&self) -> &Arc<ComponentDescription> {
        &self.description
    }

    /// Resolve the datum, materializing it if nothing is cached yet.
    ///
    /// Returns the cached value or the cached failure. A successful
    /// non-transient access marks the proxy as gotten; transient accesses
    /// leave that bookkeeping untouched.
    pub fn get(
        &self,
        ctx: &ProduceContext<'_>,
        policy: MaterializePolicy,
        transient: bool,
    ) -> Result<&(dyn Any + Send + Sync), &Arc<ProducerError>> {
        let outcome = match self.cache.get() {
            Some(cached) => cached,
            None => match policy {
                MaterializePolicy::Exclusive => self.cache.get_or_init(|| self.materialize(ctx)),
                MaterializePolicy::Racing => {
                    let computed = self.materialize(ctx);
                    // A concurrent winner may have published first; ours is
                    // then dropped here.
                    self.cache.get_or_init(move || computed)
                }
            },
        };

        match outcome {
            Ok(value) => {
                if !transient {
                    self.gotten.store(true, Ordering::Release);
                }
                Ok(&**value)
            }
            Err(e) => Err(e),
        }
    }

    fn materialize(&self, ctx: &ProduceContext<'_>) -> Materialized {
        self.materializations.fetch_add(1, Ordering::Relaxed);
        trace!(
            record = %ctx.record(),
            data = %ctx.key(),
            module = %self.description,
            interval = %ctx.interval(),
            "materializing"
        );
        let outcome = self.producer.produce_erased(ctx).map_err(Arc::new);
        if let Err(e) = &outcome {
            warn!(
                record = %ctx.record(),
                data = %ctx.key(),
                module = %self.description,
                error = %e,
                "producer failed; failure cached for the interval"
            );
        }
        outcome
    }

    /// Whether an outcome (value or failure) is cached.
    pub fn is_cached(&self) -> bool {
        self.cache.get().is_some()
    }

    /// Whether a failure is cached.
    pub fn has_failed(&self) -> bool {
        matches!(self.cache.get(), Some(Err(_)))
    }

    /// Whether the datum was successfully resolved by a non-transient
    /// access since the last invalidation.
    pub fn was_gotten(&self) -> bool {
        self.gotten.load(Ordering::Acquire)
    }

    /// Number of times the producer has run since registration.
    pub fn materialization_count(&self) -> u64 {
        self.materializations.load(Ordering::Relaxed)
    }

    /// Drop the cached outcome and the gotten flag. The registration stays.
    pub fn invalidate(&mut self) {
        self.cache.take();
        *self.gotten.get_mut() = false;
    }
}

impl fmt::Debug for DataProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataProxy")
            .field("data_type", &self.data_type())
            .field("description", &self.description)
            .field("cached", &self.is_cached())
            .field("gotten", &self.was_gotten())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::from_fn;
    use condor_core::{DataKey, RecordKey, SyncValue, ValidityInterval};
    use std::sync::atomic::AtomicUsize;

    struct Fixture {
        record: RecordKey,
        key: DataKey,
        iov: ValidityInterval,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                record: RecordKey::new("TestRecord"),
                key: DataKey::unlabeled::<i32>(),
                iov: ValidityInterval::open_ended(SyncValue(1)),
            }
        }

        fn ctx(&self) -> ProduceContext<'_> {
            ProduceContext::new(&self.record, &self.key, &self.iov)
        }
    }

    fn counting(calls: Arc<AtomicUsize>, value: i32) -> DataProxy {
        DataProxy::new(
            ComponentDescription::new("Counter", ""),
            from_fn(move |_: &ProduceContext<'_>| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            }),
        )
    }

    #[test]
    fn materializes_once_and_caches() {
        let fx = Fixture::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let proxy = counting(Arc::clone(&calls), 42);
        assert!(!proxy.is_cached());

        for _ in 0..3 {
            let v = proxy.get(&fx.ctx(), MaterializePolicy::Exclusive, false).unwrap();
            assert_eq!(v.downcast_ref::<i32>(), Some(&42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(proxy.materialization_count(), 1);
        assert!(proxy.is_cached());
        assert!(proxy.was_gotten());
    }

    #[test]
    fn repeated_access_returns_same_reference() {
        let fx = Fixture::new();
        let proxy = counting(Arc::new(AtomicUsize::new(0)), 7);
        let a = proxy.get(&fx.ctx(), MaterializePolicy::Exclusive, false).unwrap();
        let b = proxy.get(&fx.ctx(), MaterializePolicy::Exclusive, false).unwrap();
        assert!(std::ptr::eq(
            a.downcast_ref::<i32>().unwrap(),
            b.downcast_ref::<i32>().unwrap()
        ));
    }

    #[test]
    fn failure_is_cached_without_retry() {
        let fx = Fixture::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let proxy = DataProxy::new(
            ComponentDescription::new("Broken", "b"),
            from_fn(move |_: &ProduceContext<'_>| -> Result<i32, _> {
                c.fetch_add(1, Ordering::SeqCst);
                Err(ProducerError::failed("boom"))
            }),
        );

        for _ in 0..5 {
            let err = proxy
                .get(&fx.ctx(), MaterializePolicy::Exclusive, false)
                .unwrap_err();
            assert_eq!(**err, ProducerError::failed("boom"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(proxy.has_failed());
        assert!(!proxy.was_gotten());
    }

    #[test]
    fn invalidate_drops_cache_but_keeps_registration() {
        let fx = Fixture::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut proxy = counting(Arc::clone(&calls), 1);

        proxy.get(&fx.ctx(), MaterializePolicy::Exclusive, false).unwrap();
        proxy.invalidate();
        assert!(!proxy.is_cached());
        assert!(!proxy.was_gotten());
        assert!(proxy.data_type().is::<i32>());

        proxy.get(&fx.ctx(), MaterializePolicy::Exclusive, false).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn transient_access_does_not_mark_gotten() {
        let fx = Fixture::new();
        let proxy = counting(Arc::new(AtomicUsize::new(0)), 5);
        proxy.get(&fx.ctx(), MaterializePolicy::Exclusive, true).unwrap();
        assert!(proxy.is_cached());
        assert!(!proxy.was_gotten());

        proxy.get(&fx.ctx(), MaterializePolicy::Exclusive, false).unwrap();
        assert!(proxy.was_gotten());
    }

    #[test]
    fn exclusive_runs_producer_once_under_contention() {
        let fx = Fixture::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let proxy = counting(Arc::clone(&calls), 9);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let v = proxy.get(&fx.ctx(), MaterializePolicy::Exclusive, false).unwrap();
                    assert_eq!(v.downcast_ref::<i32>(), Some(&9));
                });
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn racing_readers_all_observe_the_published_value() {
        let fx = Fixture::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let proxy = counting(Arc::clone(&calls), 11);

        let addrs: Vec<usize> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        let v = proxy.get(&fx.ctx(), MaterializePolicy::Racing, false).unwrap();
                        v.downcast_ref::<i32>().unwrap() as *const i32 as usize
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
        assert!(calls.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn debug_reports_state() {
        let proxy = counting(Arc::new(AtomicUsize::new(0)), 0);
        let dbg = format!("{proxy:?}");
        assert!(dbg.contains("cached: false"), "{dbg}");
    }
}
