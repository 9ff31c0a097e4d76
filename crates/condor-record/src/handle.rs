//! [`Handle`]: the caller-facing outcome of a typed request.

use std::fmt;

use condor_core::{ComponentDescription, ResolveError};

use crate::deferred::DeferredError;

/// Result of asking a record for a `T`.
///
/// Either a borrowed reference to the provider-held value plus the
/// description of the module that produced it, or a [`DeferredError`].
/// A handle never owns the value; its lifetime is bounded by the record
/// it came from, which in turn cannot outlive the current interval.
///
/// Checking [`is_valid`](Self::is_valid) is cheap. The error is built only
/// when [`get`](Self::get) is called on a failed handle.
#[must_use]
pub struct Handle<'a, T> {
    state: HandleState<'a, T>,
}

enum HandleState<'a, T> {
    Valid {
        value: &'a T,
        description: &'a ComponentDescription,
    },
    Failed(DeferredError),
}

impl<'a, T> Handle<'a, T> {
    /// A handle to a resolved value.
    pub fn valid(value: &'a T, description: &'a ComponentDescription) -> Self {
        Self {
            state: HandleState::Valid { value, description },
        }
    }

    /// A handle carrying a deferred failure.
    pub fn failed(why: DeferredError) -> Self {
        Self {
            state: HandleState::Failed(why),
        }
    }

    /// Whether the handle holds a value.
    pub fn is_valid(&self) -> bool {
        matches!(self.state, HandleState::Valid { .. })
    }

    /// Dereference the handle.
    ///
    /// On a failed handle this constructs and returns the descriptive
    /// error captured at resolution time.
    pub fn get(&self) -> Result<&'a T, ResolveError> {
        match &self.state {
            HandleState::Valid { value, .. } => Ok(*value),
            HandleState::Failed(why) => Err(why.raise()),
        }
    }

    /// The value, if valid, discarding any failure.
    pub fn ok(&self) -> Option<&'a T> {
        match self.state {
            HandleState::Valid { value, .. } => Some(value),
            HandleState::Failed(_) => None,
        }
    }

    /// Provenance of the value, if valid.
    pub fn description(&self) -> Option<&'a ComponentDescription> {
        match self.state {
            HandleState::Valid { description, .. } => Some(description),
            HandleState::Failed(_) => None,
        }
    }

    /// The captured failure, if any.
    pub fn why_failed(&self) -> Option<&DeferredError> {
        match &self.state {
            HandleState::Valid { .. } => None,
            HandleState::Failed(why) => Some(why),
        }
    }
}

impl<T> Clone for Handle<'_, T> {
    fn clone(&self) -> Self {
        let state = match &self.state {
            HandleState::Valid { value, description } => HandleState::Valid {
                value: *value,
                description: *description,
            },
            HandleState::Failed(why) => HandleState::Failed(why.clone()),
        };
        Self { state }
    }
}

impl<T: fmt::Debug> fmt::Debug for Handle<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            HandleState::Valid { value, description } => f
                .debug_struct("Handle")
                .field("value", value)
                .field("description", description)
                .finish(),
            HandleState::Failed(_) => f.write_str("Handle(failed)"),
        }
    }
}
