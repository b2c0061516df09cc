//! Maglev consistent hashing.
//!
//! **Algorithm**: Google's Maglev load balancer hashing.
//!
//! Every node derives a permutation of the `M` table slots from two hash
//! streams, `offset = h(node) % M` and `skip = h'(node) % (M-1) + 1`, and
//! visits `offset, offset + skip, offset + 2*skip, ...` modulo `M`. The table
//! is filled in rounds: in node order, each node claims the next slot of its
//! permutation that nobody owns yet, until every slot is taken.
//!
//! **Properties**:
//! - O(1) lookup: `table[h(key) % M]`
//! - Each node owns `M/N` slots give or take one round
//! - Single-node churn moves roughly `1/N` of the slots when `M >> N`
//! - Rebuild: `O(M * N)` worst case, `O(M log M)` typical
//!
//! `M` must be prime so that every `skip` in `[1, M-1]` is coprime with it,
//! which makes each permutation visit all slots and bounds the fill loop.

use std::sync::RwLock;

use loadring_hash::{hash64, hash64_str};
use tracing::debug;

use crate::error::RouterError;
use crate::mapper::{Mapper, with_added, without_removed};
use crate::options::{Algorithm, Options};

/// XOR mix applied to the hash seed to derive the independent `skip` stream.
pub const MAGLEV_SKIP_SEED_MIX: u64 = 0x9e37_79b9_7f4a_7c15;

/// Unclaimed slot marker (only present mid-build).
const EMPTY: usize = usize::MAX;

/// Permutation cursor for one node during population.
#[derive(Clone, Copy, Debug)]
struct Permutation {
    /// Next slot to try.
    next: usize,
    /// Step between tries.
    skip: usize,
}

/// Snapshot swapped in whole on every rebuild.
#[derive(Debug, Default)]
struct MaglevState {
    nodes: Vec<String>,
    /// slot -> node index. Empty iff `nodes` is empty.
    table: Vec<usize>,
}

/// Maglev lookup-table mapper.
pub struct MaglevMapper {
    table_size: usize,
    seed: u64,
    state: RwLock<MaglevState>,
}

impl MaglevMapper {
    /// Build a mapper over `nodes` with a table of `options.table_size` slots.
    pub fn new<S: AsRef<str>>(nodes: &[S], options: &Options) -> Result<Self, RouterError> {
        let table_size = options.checked_table_size()?;
        let seed = options.hash_seed;
        let nodes = loadring_ring::dedup_nodes(nodes);
        let table = populate(&nodes, table_size, seed);
        Ok(Self {
            table_size,
            seed,
            state: RwLock::new(MaglevState { nodes, table }),
        })
    }

    /// Lookup table size `M`.
    pub fn table_size(&self) -> usize {
        self.table_size
    }

    /// Number of table slots owned by each node, in node order.
    pub fn slot_counts(&self) -> Vec<usize> {
        let state = self.state.read().expect("maglev lock poisoned");
        let mut counts = vec![0usize; state.nodes.len()];
        for &idx in &state.table {
            if let Some(c) = counts.get_mut(idx) {
                *c += 1;
            }
        }
        counts
    }

    fn rebuild(&self, state: &mut MaglevState, nodes: Vec<String>) {
        // Build first, then swap: readers wait on the write lock and never
        // see a half-filled table.
        let table = populate(&nodes, self.table_size, self.seed);
        *state = MaglevState { nodes, table };
        debug!(
            nodes = state.nodes.len(),
            table_size = self.table_size,
            "rebuilt maglev table"
        );
    }
}

impl Mapper for MaglevMapper {
    fn add(&self, nodes: &[&str]) {
        let mut state = self.state.write().expect("maglev lock poisoned");
        if let Some(next) = with_added(&state.nodes, nodes) {
            self.rebuild(&mut state, next);
        }
    }

    fn remove(&self, nodes: &[&str]) {
        let mut state = self.state.write().expect("maglev lock poisoned");
        if let Some(next) = without_removed(&state.nodes, nodes) {
            self.rebuild(&mut state, next);
        }
    }

    fn pick(&self, key: &[u8]) -> Result<String, RouterError> {
        let state = self.state.read().expect("maglev lock poisoned");
        if state.nodes.is_empty() {
            return Err(RouterError::NoNodes);
        }
        let slot = (hash64(key, self.seed) % self.table_size as u64) as usize;
        match state.table.get(slot) {
            Some(&idx) if idx < state.nodes.len() => Ok(state.nodes[idx].clone()),
            entry => Err(RouterError::CorruptTable {
                slot,
                index: entry.copied(),
                nodes: state.nodes.len(),
            }),
        }
    }

    fn nodes(&self) -> Vec<String> {
        self.state.read().expect("maglev lock poisoned").nodes.clone()
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::Maglev
    }
}

/// Fill an `m`-slot table for `nodes`. Returns an empty table for no nodes.
///
/// `m` must be a prime accepted by `Options::checked_table_size`; see the
/// module docs.
fn populate(nodes: &[String], m: usize, seed: u64) -> Vec<usize> {
    if nodes.is_empty() {
        return Vec::new();
    }

    debug_assert!(m >= 2, "maglev table size must be a prime >= 2");
    let mut perms: Vec<Permutation> = nodes
        .iter()
        .map(|node| {
            let offset = (hash64_str(node, seed) % m as u64) as usize;
            let skip =
                (hash64_str(node, seed ^ MAGLEV_SKIP_SEED_MIX) % (m as u64 - 1)) as usize + 1;
            Permutation { next: offset, skip }
        })
        .collect();

    let mut table = vec![EMPTY; m];
    let mut filled = 0;
    while filled < m {
        for (i, perm) in perms.iter_mut().enumerate() {
            // A permutation covers every slot, and at least one is still
            // free, so this terminates within `m` steps.
            let mut slot = perm.next;
            while table[slot] != EMPTY {
                slot = (slot + perm.skip) % m;
            }
            table[slot] = i;
            perm.next = (slot + perm.skip) % m;
            filled += 1;
            if filled == m {
                break;
            }
        }
    }
    table
}
