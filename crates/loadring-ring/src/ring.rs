//! Token ring implementation.

use std::collections::HashSet;
use std::num::NonZeroUsize;

use loadring_hash::hash64_str;
use tracing::debug;

use crate::error::RingError;

/// One position on the ring, owned by a physical node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Hash position on the `u64` ring.
    pub position: u64,
    /// Index into [`Ring::nodes`].
    pub node_index: usize,
}

/// Consistent hashing ring built from a node list.
///
/// Tokens are kept in a flat vector sorted by position (ties keep their
/// generation order: node order, then vnode index), so lookup is a binary
/// search and walking clockwise is an index increment.
#[derive(Debug, Clone, Default)]
pub struct Ring {
    /// Sorted by `position`.
    tokens: Vec<Token>,
    /// Node index -> node ID.
    nodes: Vec<String>,
}

impl Ring {
    /// Create a ring with no nodes and no tokens.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a ring with `vnodes` tokens per physical node.
    ///
    /// Duplicate node IDs are dropped (first occurrence wins). An empty node
    /// list produces an empty ring.
    pub fn build<S: AsRef<str>>(nodes: &[S], vnodes: usize, seed: u64) -> Result<Self, RingError> {
        let vnodes = NonZeroUsize::new(vnodes).ok_or(RingError::ZeroVnodes)?;
        Ok(Self::with_vnodes(nodes, vnodes, seed))
    }

    /// Infallible variant of [`Ring::build`] for callers that already hold a
    /// validated vnode count.
    pub fn with_vnodes<S: AsRef<str>>(nodes: &[S], vnodes: NonZeroUsize, seed: u64) -> Self {
        let nodes = dedup_nodes(nodes);
        if nodes.is_empty() {
            return Self::empty();
        }

        let mut tokens = Vec::with_capacity(nodes.len() * vnodes.get());
        for (node_index, node) in nodes.iter().enumerate() {
            for v in 0..vnodes.get() {
                tokens.push(Token {
                    position: token_position(node, v, seed),
                    node_index,
                });
            }
        }
        // Stable sort: equal positions stay in generation order.
        tokens.sort_by_key(|t| t.position);

        debug!(
            nodes = nodes.len(),
            vnodes = vnodes.get(),
            tokens = tokens.len(),
            "built ring"
        );
        Self { tokens, nodes }
    }

    /// Build a ring from explicit tokens.
    ///
    /// Tokens are sorted on entry. Fails if any token points past the end of
    /// `nodes`.
    pub fn from_tokens(nodes: Vec<String>, mut tokens: Vec<Token>) -> Result<Self, RingError> {
        if let Some(bad) = tokens.iter().find(|t| t.node_index >= nodes.len()) {
            return Err(RingError::TokenOutOfRange {
                index: bad.node_index,
                nodes: nodes.len(),
            });
        }
        tokens.sort_by_key(|t| t.position);
        Ok(Self { tokens, nodes })
    }

    /// Index into [`Ring::tokens`] of the first token whose position is
    /// `>= position`, wrapping to 0 past the last token.
    pub fn successor(&self, position: u64) -> Result<usize, RingError> {
        if self.tokens.is_empty() {
            return Err(RingError::Empty);
        }
        let i = self.tokens.partition_point(|t| t.position < position);
        Ok(if i == self.tokens.len() { 0 } else { i })
    }

    /// Node index owning `position` (the successor token's node).
    pub fn owner_index(&self, position: u64) -> Result<usize, RingError> {
        let i = self.successor(position)?;
        Ok(self.tokens[i].node_index)
    }

    /// Token index following `index`, wrapping at the end of the ring.
    pub fn next_index(&self, index: usize) -> usize {
        if index + 1 >= self.tokens.len() {
            0
        } else {
            index + 1
        }
    }

    /// Return the token at `index`, if any.
    pub fn token(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// All tokens, sorted by position.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Node IDs in index order.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Return the number of physical nodes in the ring.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Return the total number of vnodes in the ring.
    pub fn vnode_count(&self) -> usize {
        self.tokens.len()
    }

    /// True when the ring holds no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// De-duplicate node IDs, keeping the first occurrence of each.
pub fn dedup_nodes<S: AsRef<str>>(nodes: &[S]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(nodes.len());
    let mut unique = Vec::with_capacity(nodes.len());
    for node in nodes {
        let node = node.as_ref();
        if seen.insert(node) {
            unique.push(node.to_owned());
        }
    }
    unique
}

/// Position of vnode `v` of `node`: `hash64("<node>#<v>-<seed>", seed)`.
fn token_position(node: &str, v: usize, seed: u64) -> u64 {
    hash64_str(&format!("{node}#{v}-{seed}"), seed)
}
