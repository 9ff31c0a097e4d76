//! Per-transition indirection tables.
//!
//! A transition's tokens are fixed once minted: token `i` always means the
//! `i`-th distinct identity requested for that transition. Which provider
//! slot serves that identity depends on the record's current provider set,
//! so each transition keeps a dense table from token position to slot.
//! Building the table is `O(tokens)`; resolving through it is one array
//! read with no hashing on the hot path.

use indexmap::IndexSet;

use condor_core::{DataKey, ProxyIndex, TokenIndex};

/// Outcome of looking a token position up in an [`IndirectionTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotLookup {
    /// The identity is served by this provider slot.
    Provider(ProxyIndex),
    /// The identity is known to have no provider in this record.
    NoProvider,
    /// The position is beyond the table; the token was not minted for
    /// this table.
    OutOfRange,
}

/// Dense map from token position to provider slot.
///
/// `None` entries mean "known absent". Read-only once built; a rebuild
/// produces a fresh table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndirectionTable {
    slots: Vec<Option<ProxyIndex>>,
}

impl IndirectionTable {
    /// Build a table for `requests` (in token order) using `lookup` to find
    /// each identity's provider slot.
    pub fn build<'k, I, F>(requests: I, mut lookup: F) -> Self
    where
        I: IntoIterator<Item = &'k DataKey>,
        F: FnMut(&DataKey) -> Option<ProxyIndex>,
    {
        Self {
            slots: requests.into_iter().map(|key| lookup(key)).collect(),
        }
    }

    /// Resolve a token position.
    pub fn lookup(&self, index: TokenIndex) -> SlotLookup {
        match self.slots.get(index.as_usize()) {
            Some(Some(slot)) => SlotLookup::Provider(*slot),
            Some(None) => SlotLookup::NoProvider,
            None => SlotLookup::OutOfRange,
        }
    }

    /// Number of token positions.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the table has no positions.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Raw entries, in token order.
    pub fn slots(&self) -> &[Option<ProxyIndex>] {
        &self.slots
    }
}

/// The identities requested under one transition, plus their table.
#[derive(Debug, Default)]
pub(crate) struct TransitionRequests {
    requests: IndexSet<DataKey>,
    table: IndirectionTable,
}

impl TransitionRequests {
    /// Position for `key`, appending it (and its slot, via `lookup`) if new.
    pub(crate) fn mint<F>(&mut self, key: DataKey, lookup: F) -> TokenIndex
    where
        F: FnOnce(&DataKey) -> Option<ProxyIndex>,
    {
        let (position, added) = self.requests.insert_full(key);
        if added {
            let slot = self.requests.get_index(position).and_then(lookup);
            self.table.slots.push(slot);
        }
        // Distinct identities per transition stay far below u32::MAX.
        TokenIndex(position as u32)
    }

    /// Recompute every slot against a new provider layout. Token positions
    /// are unchanged.
    pub(crate) fn rebuild<F>(&mut self, lookup: F)
    where
        F: FnMut(&DataKey) -> Option<ProxyIndex>,
    {
        self.table = IndirectionTable::build(&self.requests, lookup);
    }

    pub(crate) fn requests(&self) -> &IndexSet<DataKey> {
        &self.requests
    }

    pub(crate) fn table(&self) -> &IndirectionTable {
        &self.table
    }
}
