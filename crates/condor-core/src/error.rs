//! Error types for the Condor record engine.
//!
//! Organized by who sees them: [`ResolveError`] reaches callers that
//! dereference a failed handle, [`ProducerError`] is what producer logic
//! returns, [`RegistryError`] is for the orchestrator that assembles and
//! transitions records, and [`ConfigError`] guards record configuration.

use thiserror::Error;

use crate::id::TransitionId;
use crate::key::{DataKey, RecordKey, TypeTag};

/// Failure to serve a requested datum.
///
/// Never produced at resolution time: records capture how to build one in
/// a deferred factory and only construct it when a caller dereferences
/// the failed handle. Every variant names the record kind and the
/// requested identity.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The token was never initialized, or was built for a different
    /// transition than the record being queried.
    #[error("invalid token for {type_tag} in record {record}: {detail}")]
    InvalidToken {
        /// Record kind that was queried.
        record: RecordKey,
        /// Type the token requests.
        type_tag: TypeTag,
        /// What was wrong with the token.
        detail: String,
    },
    /// No producer is registered for the identity.
    #[error("no provider registered for {key} in record {record}")]
    NoProvider {
        /// Record kind that was queried.
        record: RecordKey,
        /// Requested identity.
        key: DataKey,
    },
    /// The label is served, but as a different type than requested.
    #[error("type mismatch for {key} in record {record}: label is registered as {registered}")]
    TypeMismatch {
        /// Record kind that was queried.
        record: RecordKey,
        /// Requested identity.
        key: DataKey,
        /// Type actually registered under the label.
        registered: TypeTag,
    },
    /// The datum is served by a different module than the request tag names.
    #[error(
        "module mismatch for {key} in record {record}: requested module '{requested}', served by '{served}'"
    )]
    ModuleMismatch {
        /// Record kind that was queried.
        record: RecordKey,
        /// Requested identity.
        key: DataKey,
        /// Module label named by the request tag.
        requested: String,
        /// Module label of the serving provider.
        served: String,
    },
    /// The producer's own computation failed.
    #[error("producer {module} failed to make {key} in record {record}: {source}")]
    ProviderFailure {
        /// Record kind that was queried.
        record: RecordKey,
        /// Requested identity.
        key: DataKey,
        /// Producing module, as `Type/'label'` (or `Type` when unlabeled).
        module: String,
        /// The producer's error.
        #[source]
        source: ProducerError,
    },
}

impl ResolveError {
    /// The record kind the failure refers to.
    pub fn record(&self) -> &RecordKey {
        match self {
            Self::InvalidToken { record, .. }
            | Self::NoProvider { record, .. }
            | Self::TypeMismatch { record, .. }
            | Self::ModuleMismatch { record, .. }
            | Self::ProviderFailure { record, .. } => record,
        }
    }

    /// The requested identity, when one is known. Invalid tokens carry
    /// only a type.
    pub fn key(&self) -> Option<&DataKey> {
        match self {
            Self::InvalidToken { .. } => None,
            Self::NoProvider { key, .. }
            | Self::TypeMismatch { key, .. }
            | Self::ModuleMismatch { key, .. }
            | Self::ProviderFailure { key, .. } => Some(key),
        }
    }
}

/// Error returned by producer logic while materializing a value.
///
/// Cached by the provider for the remainder of the validity interval.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProducerError {
    /// The computation failed.
    #[error("{reason}")]
    Failed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// An input the producer needed was itself unavailable.
    #[error("dependency unavailable: {source}")]
    Dependency {
        /// Why the input could not be resolved.
        #[source]
        source: Box<ResolveError>,
    },
}

impl ProducerError {
    /// Shorthand for [`ProducerError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

impl From<ResolveError> for ProducerError {
    fn from(e: ResolveError) -> Self {
        Self::Dependency {
            source: Box::new(e),
        }
    }
}

/// Errors from assembling, binding, or transitioning a record.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two providers were registered for the same identity.
    #[error("duplicate provider for {key} in record {record}")]
    DuplicateKey {
        /// Record being assembled.
        record: RecordKey,
        /// Identity registered twice.
        key: DataKey,
    },
    /// An operation named an identity with no registered provider.
    #[error("no provider registered for {key} in record {record}")]
    UnknownKey {
        /// Record being modified.
        record: RecordKey,
        /// Identity that was not found.
        key: DataKey,
    },
    /// The transition has no indirection table in this record.
    #[error("transition {transition} is not registered with record {record}")]
    UnknownTransition {
        /// Record being bound.
        record: RecordKey,
        /// Transition that was not registered.
        transition: TransitionId,
    },
    /// Registering another transition would exceed the configured limit.
    #[error("record {record} already has the maximum of {limit} transitions")]
    TooManyTransitions {
        /// Record being configured.
        record: RecordKey,
        /// Configured limit.
        limit: usize,
    },
    /// The record is not in a state that permits the operation.
    #[error("record {record} is {state}; a valid interval is required")]
    NotValid {
        /// Record being bound.
        record: RecordKey,
        /// Current state name.
        state: &'static str,
    },
    /// The orchestrator tried to enter the invalid interval.
    #[error("cannot enter an invalid interval in record {record}")]
    InvalidInterval {
        /// Record being transitioned.
        record: RecordKey,
    },
}

/// Errors detected while validating record configuration.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `max_transitions` was zero.
    #[error("max_transitions must be at least 1")]
    ZeroTransitions,
}
