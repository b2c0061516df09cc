//! Error types for ring construction and lookup.

/// Errors produced when building or querying a [`Ring`](crate::Ring).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RingError {
    /// A ring was requested with zero virtual nodes per physical node.
    #[error("vnodes per node must be > 0")]
    ZeroVnodes,

    /// Successor lookup on a ring without tokens.
    #[error("successor lookup on an empty ring")]
    Empty,

    /// A hand-built token points past the end of the node list.
    #[error("token references node index {index}, but the ring has {nodes} nodes")]
    TokenOutOfRange {
        /// The offending node index.
        index: usize,
        /// Number of nodes on the ring.
        nodes: usize,
    },
}
