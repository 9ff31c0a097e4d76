//! How concurrent first accesses to an empty slot are resolved.

/// Strategy for materializing a provider's value when several readers find
/// the slot empty at once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaterializePolicy {
    /// The first reader to claim the slot runs the producer; concurrent
    /// readers of that slot observe its published outcome. The producer
    /// runs exactly once per interval.
    ///
    /// A producer must not request its own datum while materializing;
    /// the slot is already claimed and the request never completes.
    #[default]
    Exclusive,
    /// Every reader that finds the slot empty runs the producer. The first
    /// outcome published wins; later ones are discarded. Readers never
    /// wait on another reader's computation, at the cost of duplicate
    /// producer calls under contention.
    Racing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_exclusive() {
        assert_eq!(MaterializePolicy::default(), MaterializePolicy::Exclusive);
    }
}
