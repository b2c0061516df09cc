//! Shared test harness for loadring integration tests.
//!
//! Provides [`Cluster`]: a router over `node-0..node-N` with helpers to
//! route a key set and snapshot the resulting assignment.

use loadring_router::{Algorithm, Mapper, Options, Router};

/// Prime table size small enough to keep Maglev rebuilds fast in tests.
pub const TEST_TABLE_SIZE: usize = 10_007;

/// `node-{start}`, `node-{start+1}`, ...
pub fn node_ids(start: usize, count: usize) -> Vec<String> {
    (start..start + count).map(|i| format!("node-{i}")).collect()
}

/// `key-0..key-{count}` as raw bytes.
pub fn keys(count: usize) -> Vec<Vec<u8>> {
    (0..count).map(|i| format!("key-{i}").into_bytes()).collect()
}

/// Options used across the integration suite.
pub fn test_options(expected_keys: usize) -> Options {
    Options {
        table_size: TEST_TABLE_SIZE,
        expected_keys,
        hash_seed: 42,
        ..Options::default()
    }
}

/// A router plus the algorithm it was built for.
pub struct Cluster {
    pub router: Router,
    pub algo: Algorithm,
}

impl Cluster {
    /// Build a router for `algo` over `node-0..node-{nodes}`.
    pub fn new(algo: Algorithm, nodes: usize, options: &Options) -> Self {
        let router = Router::new(algo, options, &node_ids(0, nodes)).unwrap();
        Self { router, algo }
    }

    /// Add `node-{start}..` as `count` new nodes.
    pub fn add_nodes(&self, start: usize, count: usize) {
        let ids = node_ids(start, count);
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        self.router.add(&refs);
    }

    /// Remove the given nodes.
    pub fn remove_nodes(&self, ids: &[&str]) {
        self.router.remove(ids);
    }

    /// Route every key once and return the chosen node per key.
    pub fn assign(&self, keys: &[Vec<u8>]) -> Vec<String> {
        keys.iter()
            .map(|k| {
                self.router
                    .pick(k)
                    .unwrap_or_else(|e| panic!("{}: pick failed: {e}", self.algo))
            })
            .collect()
    }

    /// Current node IDs, in index order.
    pub fn nodes(&self) -> Vec<String> {
        self.router.nodes()
    }

    /// Per-node key counts for `assignment`, in current node order.
    pub fn counts(&self, assignment: &[String]) -> Vec<usize> {
        self.router
            .nodes()
            .iter()
            .map(|n| assignment.iter().filter(|a| *a == n).count())
            .collect()
    }
}
