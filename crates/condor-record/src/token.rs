//! [`Token`]: a precomputed, typed request identity.
//!
//! Consumers mint their tokens once at setup time through
//! [`RecordImpl::consumes`](crate::RecordImpl::consumes) and reuse them for
//! every request afterwards. A token carries its requested identity, the
//! transition it was minted for, and its fixed position in that
//! transition's indirection table. The result type `T` is carried in the
//! token's type, so a request can only ever hand back a `T`.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use condor_core::{DataKey, TokenIndex, TransitionId, TypeTag};

/// Typed request identity for a datum of type `T`.
///
/// Immutable after creation and freely shared across threads. An
/// [`uninitialized`](Self::uninitialized) token is never usable; records
/// treat it as an invalid token.
pub struct Token<T> {
    key: DataKey,
    binding: Option<(TransitionId, TokenIndex)>,
    _result: PhantomData<fn() -> T>,
}

// Compile-time assertion: Token must be Send + Sync for any T.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Token<std::rc::Rc<u8>>>();
};

impl<T: 'static> Token<T> {
    /// A token that was never minted against a record.
    pub fn uninitialized(label: impl Into<Arc<str>>) -> Self {
        Self {
            key: DataKey::of::<T>(label),
            binding: None,
            _result: PhantomData,
        }
    }

    pub(crate) fn bound(key: DataKey, transition: TransitionId, index: TokenIndex) -> Self {
        debug_assert!(key.type_tag().is::<T>());
        Self {
            key,
            binding: Some((transition, index)),
            _result: PhantomData,
        }
    }
}

impl<T> Token<T> {
    /// Requested identity.
    pub fn key(&self) -> &DataKey {
        &self.key
    }

    /// Requested label.
    pub fn label(&self) -> &str {
        self.key.label()
    }

    /// Requested type.
    pub fn type_tag(&self) -> TypeTag {
        self.key.type_tag()
    }

    /// Whether the token was minted against a record.
    pub fn is_initialized(&self) -> bool {
        self.binding.is_some()
    }

    /// Transition the token was minted for.
    pub fn transition(&self) -> Option<TransitionId> {
        self.binding.map(|(transition, _)| transition)
    }

    /// Fixed position in the transition's indirection table.
    pub fn index(&self) -> Option<TokenIndex> {
        self.binding.map(|(_, index)| index)
    }
}

impl<T: 'static> Default for Token<T> {
    fn default() -> Self {
        Self::uninitialized("")
    }
}

impl<T> Clone for Token<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            binding: self.binding,
            _result: PhantomData,
        }
    }
}

impl<T> PartialEq for Token<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.binding == other.binding
    }
}

impl<T> Eq for Token<T> {}

impl<T> fmt::Debug for Token<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("key", &self.key)
            .field("transition", &self.transition())
            .field("index", &self.index())
            .finish()
    }
}
