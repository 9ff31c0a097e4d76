//! Strongly-typed indices and the [`CacheIdentifier`] counter.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one request context (a "transition") that consumers were
/// built against.
///
/// Each transition owns its own indirection table inside a record, so two
/// contexts may resolve the same token layout to different provider slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionId(pub u32);

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TransitionId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Position of a provider slot in a record's provider arena.
///
/// Only meaningful for the registry generation that produced it; a
/// rebuild may reassign every index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyIndex(pub u32);

impl ProxyIndex {
    /// The index as a `usize`, for slice addressing.
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ProxyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ProxyIndex {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Fixed positional index of a token within its transition's request list.
///
/// Stable for the lifetime of the job: rebuilds change what a token index
/// maps to, never the index itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenIndex(pub u32);

impl TokenIndex {
    /// The index as a `usize`, for slice addressing.
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TokenIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TokenIndex {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Counter for [`CacheIdentifier`] allocation. Starts at 1 so that zero
/// stays reserved for "never observed".
static CACHE_IDENTIFIER_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Signals whether data a caller derived from a record is still current.
///
/// Callers that cache anything computed from a record should keep the
/// identifier alongside it; a different identifier on the next visit means
/// the cached derivative is stale. Values come from a process-wide
/// monotonic counter, so a record that is torn down and rebuilt never
/// hands out an identifier it (or any other record) used before.
///
/// [`CacheIdentifier::UNOBSERVED`] is never returned by a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheIdentifier(u64);

impl CacheIdentifier {
    /// Reserved value for "not yet observed". Callers may initialise their
    /// own bookkeeping with it.
    pub const UNOBSERVED: Self = Self(0);

    /// Allocate a fresh identifier, strictly greater than every identifier
    /// previously allocated in this process. Thread-safe.
    pub fn next() -> Self {
        Self(CACHE_IDENTIFIER_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }

    /// Whether this is the reserved [`UNOBSERVED`](Self::UNOBSERVED) value.
    pub fn is_unobserved(self) -> bool {
        self.0 == 0
    }
}

impl Default for CacheIdentifier {
    fn default() -> Self {
        Self::UNOBSERVED
    }
}

impl fmt::Display for CacheIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
