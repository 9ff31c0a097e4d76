//! Epoch markers and the [`ValidityInterval`] they bound.

use std::fmt;

/// A point on the job's monotonically ordered epoch axis.
///
/// The engine never interprets the value beyond its ordering; an
/// orchestrator may pack run/block/event numbers or timestamps into it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SyncValue(pub u64);

impl SyncValue {
    /// The earliest representable marker.
    pub const BEGINNING_OF_TIME: Self = Self(0);
    /// The latest representable marker; used for open-ended intervals.
    pub const END_OF_TIME: Self = Self(u64::MAX);
}

impl fmt::Display for SyncValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::END_OF_TIME => f.write_str("end-of-time"),
            Self(v) => write!(f, "{v}"),
        }
    }
}

impl From<u64> for SyncValue {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Inclusive span `[first, last]` over which a record's contents are current.
///
/// Immutable once built. The distinguished [`invalid`](Self::invalid)
/// interval contains nothing and is what a record reports before its
/// first interval and after its current one ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValidityInterval {
    bounds: Option<(SyncValue, SyncValue)>,
}

impl ValidityInterval {
    /// Build `[first, last]`. Returns `None` if `first > last`.
    pub fn new(first: SyncValue, last: SyncValue) -> Option<Self> {
        (first <= last).then_some(Self {
            bounds: Some((first, last)),
        })
    }

    /// `[first, END_OF_TIME]`: an interval whose end is not yet known.
    pub fn open_ended(first: SyncValue) -> Self {
        Self {
            bounds: Some((first, SyncValue::END_OF_TIME)),
        }
    }

    /// The interval that contains nothing.
    pub const fn invalid() -> Self {
        Self { bounds: None }
    }

    /// Whether this is a real (non-empty) interval.
    pub fn is_valid(&self) -> bool {
        self.bounds.is_some()
    }

    /// Lower bound, or `None` for the invalid interval.
    pub fn first(&self) -> Option<SyncValue> {
        self.bounds.map(|(first, _)| first)
    }

    /// Upper bound, or `None` for the invalid interval.
    pub fn last(&self) -> Option<SyncValue> {
        self.bounds.map(|(_, last)| last)
    }

    /// Whether `at` falls inside the interval.
    pub fn contains(&self, at: SyncValue) -> bool {
        match self.bounds {
            Some((first, last)) => first <= at && at <= last,
            None => false,
        }
    }

    /// Whether `other` is this interval with (possibly) a different end:
    /// same start marker, both valid. Entering an extension keeps cached
    /// values current.
    pub fn is_extension_of(&self, other: &Self) -> bool {
        match (self.first(), other.first()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl Default for ValidityInterval {
    fn default() -> Self {
        Self::invalid()
    }
}

impl fmt::Display for ValidityInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds {
            Some((first, last)) => write!(f, "[{first}, {last}]"),
            None => f.write_str("[invalid]"),
        }
    }
}
