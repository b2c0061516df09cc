//! The mapping contract shared by all strategies.

use loadring_ring::dedup_nodes;

use crate::chbl::CapacityStatus;
use crate::error::RouterError;
use crate::options::Algorithm;

/// Maps keys to nodes over a changing node set.
///
/// Node IDs are opaque strings. Every implementation de-duplicates its node
/// list on each membership change, keeping first-seen order, and guards its
/// state so that concurrent callers never observe a half-rebuilt structure.
///
/// # Idempotence
///
/// For [`Algorithm::Ring`], [`Algorithm::Jump`] and [`Algorithm::Maglev`],
/// `pick` is a pure function of the key, the node list and the options.
/// [`Algorithm::Chbl`] is different: every successful `pick` consumes one
/// unit of the chosen node's capacity, so repeating a key may return a
/// different node and eventually fail with
/// [`RouterError::CapacityExhausted`].
pub trait Mapper: Send + Sync {
    /// Register nodes. Re-adding a present node is a no-op.
    fn add(&self, nodes: &[&str]);

    /// Unregister nodes. Removing an absent node is a no-op.
    fn remove(&self, nodes: &[&str]);

    /// Choose the node for `key`.
    ///
    /// Fails with [`RouterError::NoNodes`] when no node is registered.
    fn pick(&self, key: &[u8]) -> Result<String, RouterError>;

    /// Registered nodes, in index order.
    fn nodes(&self) -> Vec<String>;

    /// Which strategy this is.
    fn algorithm(&self) -> Algorithm;

    /// Load snapshot for bounded-load mappers; `None` for the others.
    fn capacity_status(&self) -> Option<CapacityStatus> {
        None
    }
}

/// `current ∪ added`, keeping `current` order and appending new nodes in
/// first-seen order. Returns `None` when nothing would change.
///
/// `current` is already de-duplicated, so a length change is the only way
/// the result can differ.
pub(crate) fn with_added(current: &[String], added: &[&str]) -> Option<Vec<String>> {
    let merged = dedup_nodes(
        &current
            .iter()
            .map(String::as_str)
            .chain(added.iter().copied())
            .collect::<Vec<_>>(),
    );
    (merged.len() != current.len()).then_some(merged)
}

/// `current \ removed`. Returns `None` when nothing would change.
pub(crate) fn without_removed(current: &[String], removed: &[&str]) -> Option<Vec<String>> {
    let kept: Vec<String> = current
        .iter()
        .filter(|n| !removed.contains(&n.as_str()))
        .cloned()
        .collect();
    (kept.len() != current.len()).then_some(kept)
}
