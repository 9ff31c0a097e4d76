//! Test utilities and fixture producers for Condor development.
//!
//! Provides counting, failing, slow and constant [`Produce`]
//! implementations, plus small helpers for building providers and
//! intervals in tests.
//!
//! [`Produce`]: condor_proxy::Produce

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{ConstProducer, CountingProducer, FailingProducer, SlowProducer};

use condor_core::{ComponentDescription, SyncValue, ValidityInterval};
use condor_proxy::{DataProxy, Produce};

/// Wrap `producer` in a provider described as `module_type/'label'`.
pub fn provider<P: Produce>(module_type: &str, label: &str, producer: P) -> DataProxy {
    DataProxy::new(ComponentDescription::new(module_type, label), producer)
}

/// Closed interval `[first, last]`.
///
/// # Panics
///
/// If `first > last`.
pub fn interval(first: u64, last: u64) -> ValidityInterval {
    ValidityInterval::new(SyncValue(first), SyncValue(last))
        .unwrap_or_else(|| panic!("bad test interval [{first}, {last}]"))
}
