//! Benchmark profiles for the Condor record engine.
//!
//! - [`reference_record`]: one record with [`REFERENCE_PROVIDERS`] labeled
//!   `u64` providers and a token per provider, interval already set.
//! - [`reference_providers`]: the provider set alone, for rebuild benches.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use condor_core::{
    ComponentDescription, ProducerError, RecordKey, RegistryError, SyncValue, TransitionId,
    ValidityInterval,
};
use condor_proxy::{from_fn, DataProxy};
use condor_record::{RecordImpl, Token};

/// Provider count of the reference profile.
pub const REFERENCE_PROVIDERS: usize = 64;

/// Transition the reference tokens are minted for.
pub const REFERENCE_TRANSITION: TransitionId = TransitionId(0);

/// Label of the `i`-th reference provider.
pub fn label(i: usize) -> String {
    format!("channel{i:03}")
}

/// `n` providers, the `i`-th producing `i * i` under [`label(i)`](label).
pub fn reference_providers(n: usize) -> Vec<(String, DataProxy)> {
    (0..n)
        .map(|i| {
            let proxy = DataProxy::new(
                ComponentDescription::new("SquareProducer", label(i)),
                from_fn(move |_| Ok::<_, ProducerError>((i * i) as u64)),
            );
            (label(i), proxy)
        })
        .collect()
}

/// Build the reference profile: `n` providers, one token each, and a valid
/// interval `[1, 1000]`.
pub fn reference_record(n: usize) -> Result<(RecordImpl, Vec<Token<u64>>), RegistryError> {
    let mut record = RecordImpl::new(RecordKey::new("BenchRecord"));
    record.rebuild(reference_providers(n))?;
    let tokens = (0..n)
        .map(|i| record.consumes::<u64>(REFERENCE_TRANSITION, label(i)))
        .collect::<Result<Vec<_>, _>>()?;
    record.set_validity_interval(reference_interval(1))?;
    Ok((record, tokens))
}

/// `[first, first + 999]`.
pub fn reference_interval(first: u64) -> ValidityInterval {
    ValidityInterval::new(SyncValue(first), SyncValue(first + 999))
        .unwrap_or_else(|| ValidityInterval::open_ended(SyncValue(first)))
}
