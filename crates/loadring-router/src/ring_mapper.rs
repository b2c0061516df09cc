//! Plain consistent hashing: key -> ring successor -> node.
//!
//! No load caps and no fallback. Serves as the baseline the bounded-load
//! mapper is compared against.

use std::num::NonZeroUsize;
use std::sync::RwLock;

use loadring_hash::hash64;
use loadring_ring::Ring;
use tracing::debug;

use crate::error::RouterError;
use crate::mapper::{Mapper, with_added, without_removed};
use crate::options::{Algorithm, Options};

/// Consistent hashing over a vnode ring.
pub struct RingMapper {
    vnodes: NonZeroUsize,
    seed: u64,
    ring: RwLock<Ring>,
}

impl RingMapper {
    /// Build a mapper over `nodes` using `options.vnodes` and
    /// `options.hash_seed`.
    pub fn new<S: AsRef<str>>(nodes: &[S], options: &Options) -> Result<Self, RouterError> {
        let vnodes = options.checked_vnodes()?;
        let seed = options.hash_seed;
        Ok(Self {
            vnodes,
            seed,
            ring: RwLock::new(Ring::with_vnodes(nodes, vnodes, seed)),
        })
    }

    fn rebuild(&self, ring: &mut Ring, nodes: Vec<String>) {
        *ring = Ring::with_vnodes(&nodes, self.vnodes, self.seed);
        debug!(nodes = ring.node_count(), "rebuilt ring mapper");
    }
}

impl Mapper for RingMapper {
    fn add(&self, nodes: &[&str]) {
        let mut ring = self.ring.write().expect("ring lock poisoned");
        if let Some(next) = with_added(ring.nodes(), nodes) {
            self.rebuild(&mut ring, next);
        }
    }

    fn remove(&self, nodes: &[&str]) {
        let mut ring = self.ring.write().expect("ring lock poisoned");
        if let Some(next) = without_removed(ring.nodes(), nodes) {
            self.rebuild(&mut ring, next);
        }
    }

    fn pick(&self, key: &[u8]) -> Result<String, RouterError> {
        let ring = self.ring.read().expect("ring lock poisoned");
        if ring.is_empty() {
            return Err(RouterError::NoNodes);
        }
        let idx = ring.owner_index(hash64(key, self.seed))?;
        Ok(ring.nodes()[idx].clone())
    }

    fn nodes(&self) -> Vec<String> {
        self.ring.read().expect("ring lock poisoned").nodes().to_vec()
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::Ring
    }
}
