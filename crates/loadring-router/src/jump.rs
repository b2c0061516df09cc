//! Jump consistent hashing.
//!
//! From "A Fast, Minimal Memory, Consistent Hash Algorithm" by John Lamping
//! and Eric Veach (2014). Buckets are indices into the node list, so the
//! mapper needs no auxiliary structure; lookup costs `O(ln nodes)` expected,
//! `O(nodes)` worst case. Growing from N to N+1 nodes moves about
//! `1/(N+1)` of the keys, all of them onto the new last node.
//!
//! Jump only tolerates changes at the end of the list gracefully: removing
//! a node from the middle shifts every later bucket.

use std::sync::RwLock;

use loadring_hash::hash64;
use tracing::debug;

use crate::error::RouterError;
use crate::mapper::{Mapper, with_added, without_removed};
use crate::options::{Algorithm, Options};

/// Multiplier of the 64-bit linear congruential generator embedded in the
/// jump recurrence.
pub const JUMP_MULTIPLIER: u64 = 2862933555777941757;

/// Map a 64-bit key onto `0..buckets`.
///
/// Returns 0 when `buckets` is 0; callers guard against the empty case.
pub fn jump_bucket(mut key: u64, buckets: usize) -> usize {
    let mut b: i64 = -1;
    let mut j: i64 = 0;
    while j < buckets as i64 {
        b = j;
        key = key.wrapping_mul(JUMP_MULTIPLIER).wrapping_add(1);
        j = ((b + 1) as f64 * ((1u64 << 31) as f64 / ((key >> 33) + 1) as f64)) as i64;
    }
    b.max(0) as usize
}

/// Jump consistent hashing over an ordered node list.
///
/// Keys are always hashed with seed 0; [`Options::hash_seed`] is ignored.
pub struct JumpMapper {
    nodes: RwLock<Vec<String>>,
}

impl JumpMapper {
    /// Build a mapper over `nodes`. Jump has no tunables, so this cannot fail.
    pub fn new<S: AsRef<str>>(nodes: &[S], _options: &Options) -> Self {
        Self {
            nodes: RwLock::new(loadring_ring::dedup_nodes(nodes)),
        }
    }
}

impl Mapper for JumpMapper {
    fn add(&self, nodes: &[&str]) {
        let mut current = self.nodes.write().expect("jump lock poisoned");
        if let Some(next) = with_added(&current, nodes) {
            *current = next;
            debug!(nodes = current.len(), "jump node list grown");
        }
    }

    fn remove(&self, nodes: &[&str]) {
        let mut current = self.nodes.write().expect("jump lock poisoned");
        if let Some(next) = without_removed(&current, nodes) {
            *current = next;
            debug!(nodes = current.len(), "jump node list shrunk");
        }
    }

    fn pick(&self, key: &[u8]) -> Result<String, RouterError> {
        let nodes = self.nodes.read().expect("jump lock poisoned");
        if nodes.is_empty() {
            return Err(RouterError::NoNodes);
        }
        let bucket = jump_bucket(hash64(key, 0), nodes.len());
        Ok(nodes[bucket].clone())
    }

    fn nodes(&self) -> Vec<String> {
        self.nodes.read().expect("jump lock poisoned").clone()
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::Jump
    }
}
