//! Condor: interval-scoped, lazily materialized data records.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Condor sub-crates. For most users, adding `condor` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use condor::prelude::*;
//!
//! let mut calib = RecordImpl::new(RecordKey::new("CalibRecord"));
//! calib
//!     .add_proxy(
//!         "pedestal",
//!         DataProxy::new(
//!             ComponentDescription::new("PedestalProducer", "peds"),
//!             from_fn(|ctx: &ProduceContext<'_>| {
//!                 Ok(ctx.interval().first().map_or(0, |first| first.0) as f64 * 0.5)
//!             }),
//!         ),
//!     )
//!     .unwrap();
//!
//! // Setup: mint tokens once per consumer transition.
//! let pedestal = calib.consumes::<f64>(TransitionId(0), "pedestal").unwrap();
//!
//! // Each interval: set it, bind a view, request.
//! calib
//!     .set_validity_interval(ValidityInterval::new(SyncValue(10), SyncValue(19)).unwrap())
//!     .unwrap();
//! let record = calib.record(TransitionId(0)).unwrap();
//! let handle = record.get(&pedestal);
//! assert!(handle.is_valid());
//! assert_eq!(handle.get(), Ok(&5.0));
//! assert_eq!(handle.description().unwrap().label, "peds");
//!
//! // Absence is a failed handle, not an error, until dereferenced.
//! let missing = record.get_by_label::<f64>("gain");
//! assert!(matches!(missing.get(), Err(ResolveError::NoProvider { .. })));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `condor-core` | Identities, intervals, IDs, error types |
//! | [`proxy`] | `condor-proxy` | Producer trait and the caching provider slot |
//! | [`record`] | `condor-record` | Registry, tokens, record views, handles |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Identities, intervals, IDs and error types (`condor-core`).
pub use condor_core as types;

/// Producers and the caching provider slot (`condor-proxy`).
///
/// Implement [`proxy::Produce`] for provider logic, or wrap a closure with
/// [`proxy::from_fn`].
pub use condor_proxy as proxy;

/// Provider registry, tokens, record views and handles (`condor-record`).
///
/// [`record::RecordImpl`] owns the providers; [`record::Record`] is the
/// per-transition read view.
pub use condor_record as record;

/// Common imports for typical Condor usage.
///
/// ```rust
/// use condor::prelude::*;
/// ```
pub mod prelude {
    // Identities and intervals
    pub use condor_core::{
        CacheIdentifier, ComponentDescription, DataKey, InputTag, RecordKey, SyncValue,
        TransitionId, TypeTag, ValidityInterval,
    };

    // Errors
    pub use condor_core::{ConfigError, ProducerError, RegistryError, ResolveError};

    // Providers
    pub use condor_proxy::{
        from_fn, DataProxy, DataSource, MaterializePolicy, Produce, ProduceContext,
    };

    // Records
    pub use condor_record::{
        DeferredError, Handle, Record, RecordConfig, RecordImpl, RecordState, Token,
    };
}
