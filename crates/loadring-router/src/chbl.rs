//! Consistent hashing with bounded loads (CH-BL).
//!
//! Keys are placed on a vnode ring as in plain consistent hashing, but every
//! node has a hard capacity
//!
//! ```text
//! capacity_per_node = ceil(load_factor * expected_keys / nodes)
//! ```
//!
//! and a key whose successor is full walks clockwise to the next token with
//! spare capacity. After `walk_threshold` full tokens the key is hashed a
//! second time with an independent seed, and the less-loaded of the two
//! candidates with room wins (two-choice fallback). A full revolution
//! without room is a configuration error, reported as
//! [`RouterError::CapacityExhausted`].
//!
//! Loads live next to the ring behind a single mutex: every `pick` mutates
//! them, and a race between two picks could push a node past its capacity.
//! Any membership change rebuilds the ring and zeroes all loads.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use loadring_hash::hash64;
use loadring_ring::{Ring, RingError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::RouterError;
use crate::mapper::{Mapper, with_added, without_removed};
use crate::options::{Algorithm, Options};

/// XOR mix deriving the fallback seed from the primary one.
pub const CHBL_FALLBACK_SEED_MIX: u64 = 0x9e37_79b9_7f4a_7c15;

/// Load of one node at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLoad {
    /// Node ID.
    pub node: String,
    /// Keys currently assigned.
    pub load: usize,
    /// Capacity limit.
    pub capacity: usize,
    /// `load / capacity` as a percentage in `0..=100`.
    pub load_percent: f64,
}

/// Consistent snapshot of CH-BL load state, taken under the mapper's lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityStatus {
    /// Capacity shared by every node.
    pub capacity_per_node: usize,
    /// Per-node loads, in node order.
    pub nodes: Vec<NodeLoad>,
    /// Nodes whose load has reached capacity.
    pub at_capacity: Vec<String>,
}

/// Ring and load counters, always replaced and read together.
struct ChblState {
    ring: Ring,
    /// node index -> keys assigned since the last rebuild.
    load: Vec<usize>,
    capacity_per_node: usize,
}

impl ChblState {
    fn has_room(&self, node: usize) -> bool {
        self.load[node] < self.capacity_per_node
    }

    fn assign(&mut self, node: usize) -> String {
        self.load[node] += 1;
        self.ring.nodes()[node].clone()
    }
}

/// Bounded-load consistent hashing mapper.
///
/// Unlike the other mappers, [`Mapper::pick`] is side-effecting: each call
/// consumes one unit of capacity on the returned node, so repeated calls with
/// the same key are not idempotent.
pub struct ChblMapper {
    vnodes: NonZeroUsize,
    load_factor: f64,
    expected_keys: usize,
    walk_threshold: usize,
    /// Primary stream; also places the ring tokens.
    seed1: u64,
    /// Fallback stream for the second candidate.
    seed2: u64,
    state: Mutex<ChblState>,
}

impl ChblMapper {
    /// Build a mapper over `nodes`.
    ///
    /// Validates `vnodes > 0` and `load_factor >= 1.0`. A zero
    /// `expected_keys` is accepted but degrades capacity to one key per node
    /// times the load factor.
    pub fn new<S: AsRef<str>>(nodes: &[S], options: &Options) -> Result<Self, RouterError> {
        let vnodes = options.checked_vnodes()?;
        let load_factor = options.checked_load_factor()?;
        // A zero seed would make both streams collapse onto well-known
        // values; shift it.
        let seed1 = if options.hash_seed == 0 {
            1
        } else {
            options.hash_seed
        };

        let mut mapper = Self {
            vnodes,
            load_factor,
            expected_keys: options.expected_keys,
            walk_threshold: options.walk_threshold,
            seed1,
            seed2: seed1 ^ CHBL_FALLBACK_SEED_MIX,
            state: Mutex::new(ChblState {
                ring: Ring::empty(),
                load: Vec::new(),
                capacity_per_node: 0,
            }),
        };
        let state = mapper.build_state(loadring_ring::dedup_nodes(nodes));
        *mapper.state.get_mut().expect("chbl lock poisoned") = state;
        Ok(mapper)
    }

    /// Capacity currently enforced on every node (0 with no nodes).
    pub fn capacity_per_node(&self) -> usize {
        self.state.lock().expect("chbl lock poisoned").capacity_per_node
    }

    /// Zero every load counter without touching membership.
    pub fn reset_loads(&self) {
        let mut state = self.state.lock().expect("chbl lock poisoned");
        state.load.iter_mut().for_each(|l| *l = 0);
    }

    /// Snapshot of per-node loads against capacity.
    pub fn status(&self) -> CapacityStatus {
        let state = self.state.lock().expect("chbl lock poisoned");
        let capacity = state.capacity_per_node;
        let nodes: Vec<NodeLoad> = state
            .ring
            .nodes()
            .iter()
            .zip(&state.load)
            .map(|(node, &load)| NodeLoad {
                node: node.clone(),
                load,
                capacity,
                load_percent: if capacity == 0 {
                    0.0
                } else {
                    load as f64 / capacity as f64 * 100.0
                },
            })
            .collect();
        let at_capacity = nodes
            .iter()
            .filter(|n| n.load >= capacity)
            .map(|n| n.node.clone())
            .collect();
        CapacityStatus {
            capacity_per_node: capacity,
            nodes,
            at_capacity,
        }
    }

    fn build_state(&self, nodes: Vec<String>) -> ChblState {
        let ring = Ring::with_vnodes(&nodes, self.vnodes, self.seed1);
        let capacity_per_node = capacity_for(self.load_factor, self.expected_keys, nodes.len());

        if self.expected_keys == 0 && !nodes.is_empty() {
            warn!(
                nodes = nodes.len(),
                capacity_per_node,
                "expected_keys unset; capacity degraded to ceil(load_factor) keys per node"
            );
        }
        debug!(
            nodes = nodes.len(),
            tokens = ring.vnode_count(),
            capacity_per_node,
            "rebuilt chbl ring"
        );

        ChblState {
            ring,
            load: vec![0; nodes.len()],
            capacity_per_node,
        }
    }

    /// Second candidate for `key`, compared against the walk's current node.
    ///
    /// Returns the node to assign, or `None` when neither has room.
    fn two_choice(
        &self,
        state: &ChblState,
        key: &[u8],
        current: usize,
    ) -> Result<Option<usize>, RouterError> {
        let other = state.ring.owner_index(hash64(key, self.seed2))?;
        let choice = match (state.has_room(current), state.has_room(other)) {
            (false, false) => None,
            (true, false) => Some(current),
            (false, true) => Some(other),
            // Ties favour the walk candidate.
            (true, true) if state.load[current] <= state.load[other] => Some(current),
            (true, true) => Some(other),
        };
        Ok(choice)
    }
}

/// `ceil(load_factor * expected_keys / nodes)`, with `expected_keys`
/// defaulting to `nodes` when unset.
fn capacity_for(load_factor: f64, expected_keys: usize, nodes: usize) -> usize {
    if nodes == 0 {
        return 0;
    }
    let expected = if expected_keys == 0 {
        nodes
    } else {
        expected_keys
    };
    (load_factor * expected as f64 / nodes as f64).ceil() as usize
}

impl Mapper for ChblMapper {
    fn add(&self, nodes: &[&str]) {
        let mut state = self.state.lock().expect("chbl lock poisoned");
        if let Some(next) = with_added(state.ring.nodes(), nodes) {
            *state = self.build_state(next);
        }
    }

    fn remove(&self, nodes: &[&str]) {
        let mut state = self.state.lock().expect("chbl lock poisoned");
        if let Some(next) = without_removed(state.ring.nodes(), nodes) {
            *state = self.build_state(next);
        }
    }

    fn pick(&self, key: &[u8]) -> Result<String, RouterError> {
        let mut state = self.state.lock().expect("chbl lock poisoned");
        if state.ring.is_empty() {
            return Err(RouterError::NoNodes);
        }

        let start = state.ring.successor(hash64(key, self.seed1))?;
        let mut idx = start;
        let mut steps = 0usize;

        loop {
            let node = state
                .ring
                .token(idx)
                .map(|t| t.node_index)
                .ok_or(RingError::Empty)?;
            if state.has_room(node) {
                return Ok(state.assign(node));
            }

            steps += 1;
            if steps == self.walk_threshold {
                if let Some(chosen) = self.two_choice(&state, key, node)? {
                    return Ok(state.assign(chosen));
                }
            }

            idx = state.ring.next_index(idx);
            if idx == start {
                let nodes = state.ring.node_count();
                warn!(
                    nodes,
                    capacity_per_node = state.capacity_per_node,
                    "chbl ring exhausted"
                );
                return Err(RouterError::CapacityExhausted {
                    capacity_per_node: state.capacity_per_node,
                    nodes,
                });
            }
        }
    }

    fn nodes(&self) -> Vec<String> {
        self.state
            .lock()
            .expect("chbl lock poisoned")
            .ring
            .nodes()
            .to_vec()
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::Chbl
    }

    fn capacity_status(&self) -> Option<CapacityStatus> {
        Some(self.status())
    }
}
