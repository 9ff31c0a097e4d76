//! [`DeferredError`]: a failure captured as "how to build it".
//!
//! Resolution never constructs a [`ResolveError`]. It captures the pieces
//! (record, identity, producer, cause) in a shared closure and hands that
//! to the handle. Only a caller that dereferences the failed handle pays
//! for building the error value.

use std::fmt;
use std::sync::Arc;

use condor_core::{
    ComponentDescription, DataKey, ProducerError, RecordKey, ResolveError, TokenIndex,
    TransitionId, TypeTag,
};

/// What is wrong with a token presented to a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TokenFault {
    Uninitialized,
    WrongTransition {
        minted: TransitionId,
        bound: TransitionId,
    },
    OutOfRange(TokenIndex),
}

impl fmt::Display for TokenFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => f.write_str("token was never minted"),
            Self::WrongTransition { minted, bound } => write!(
                f,
                "token minted for transition {minted}, record bound to transition {bound}"
            ),
            Self::OutOfRange(index) => {
                write!(f, "token position {index} is outside the indirection table")
            }
        }
    }
}

/// A not-yet-constructed [`ResolveError`].
///
/// Cheap to clone: clones share the same factory.
#[derive(Clone)]
pub struct DeferredError {
    factory: Arc<dyn Fn() -> ResolveError + Send + Sync>,
}

// Compile-time assertion: DeferredError must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<DeferredError>();
};

impl DeferredError {
    /// Wrap an arbitrary error factory.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> ResolveError + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
        }
    }

    /// Build the error. Each call constructs a fresh value.
    pub fn raise(&self) -> ResolveError {
        (self.factory)()
    }

    pub(crate) fn no_provider(record: RecordKey, key: DataKey) -> Self {
        Self::new(move || ResolveError::NoProvider {
            record: record.clone(),
            key: key.clone(),
        })
    }

    pub(crate) fn invalid_token(record: RecordKey, type_tag: TypeTag, fault: TokenFault) -> Self {
        Self::new(move || ResolveError::InvalidToken {
            record: record.clone(),
            type_tag,
            detail: fault.to_string(),
        })
    }

    pub(crate) fn type_mismatch(record: RecordKey, key: DataKey, registered: TypeTag) -> Self {
        Self::new(move || ResolveError::TypeMismatch {
            record: record.clone(),
            key: key.clone(),
            registered,
        })
    }

    pub(crate) fn provider_failure(
        record: RecordKey,
        key: DataKey,
        description: Arc<ComponentDescription>,
        cause: Arc<ProducerError>,
    ) -> Self {
        Self::new(move || ResolveError::ProviderFailure {
            record: record.clone(),
            key: key.clone(),
            module: description.to_string(),
            source: ProducerError::clone(&cause),
        })
    }
}

impl fmt::Debug for DeferredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeferredError(..)")
    }
}
