//! Error types for mapper construction and lookup.

use loadring_ring::RingError;

/// Errors produced by the mappers and the [`Router`](crate::Router) facade.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouterError {
    /// The algorithm identifier is not one of `ring`, `jump`, `maglev`, `chbl`.
    #[error("unknown algorithm: {0:?} (expected ring|jump|maglev|chbl)")]
    UnknownAlgorithm(String),

    /// `vnodes` was zero for a ring-based strategy.
    #[error("vnodes must be > 0")]
    InvalidVnodes,

    /// The CH-BL load factor was below 1.0 (or not a number).
    #[error("load factor must be >= 1.0, got {0}")]
    InvalidLoadFactor(f64),

    /// The Maglev table size was not a prime in `[2, MAX_TABLE_SIZE]`.
    #[error(
        "maglev table size must be a prime between 2 and {max}, got {0}",
        max = crate::MAX_TABLE_SIZE
    )]
    InvalidTableSize(usize),

    /// `pick` was called with no nodes registered.
    #[error("no nodes registered")]
    NoNodes,

    /// A Maglev table entry does not reference a live node.
    ///
    /// Signals a build defect; a correctly populated table never hits this.
    #[error("maglev table slot {slot} holds {index:?}, but only {nodes} nodes exist")]
    CorruptTable {
        /// Slot the key hashed to.
        slot: usize,
        /// Entry found there (`None` if the slot does not exist).
        index: Option<usize>,
        /// Number of registered nodes.
        nodes: usize,
    },

    /// CH-BL walked the whole ring without finding spare capacity.
    ///
    /// `load_factor * expected_keys` is too small for the actual call
    /// volume; the caller must reconfigure and rebuild.
    #[error(
        "all {nodes} nodes at capacity ({capacity_per_node} keys each); \
         increase expected_keys or load_factor"
    )]
    CapacityExhausted {
        /// Per-node capacity in effect.
        capacity_per_node: usize,
        /// Number of registered nodes.
        nodes: usize,
    },

    /// The underlying ring rejected a lookup or build.
    #[error("ring error: {0}")]
    Ring(#[from] RingError),
}
