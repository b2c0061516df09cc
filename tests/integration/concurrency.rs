//! Integration test: concurrent callers.
//!
//! Many threads pick, add and remove against one shared router. Verifies
//! that the CH-BL bound holds under any interleaving and that readers of
//! the other mappers never see a half-built structure.

use std::sync::{Arc, Barrier};
use std::thread;

use loadring_integration_tests::{Cluster, keys, node_ids, test_options};
use loadring_router::{Algorithm, Mapper, RouterError};

const THREADS: usize = 8;

/// 8 threads, 1 250 picks each, against a CH-BL router sized for exactly
/// that volume. No node may exceed capacity and every pick is counted.
#[test]
fn test_chbl_concurrent_picks_stay_bounded() {
    let per_thread = 1_250;
    let total = THREADS * per_thread;
    let c = Arc::new(Cluster::new(Algorithm::Chbl, 4, &test_options(total)));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let c = c.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait(); // Start all pickers simultaneously.
                for i in 0..per_thread {
                    c.router.pick(format!("t{t}-k{i}").as_bytes()).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let status = c.router.capacity_status().unwrap();
    let sum: usize = status.nodes.iter().map(|n| n.load).sum();
    assert_eq!(sum, total);
    for n in &status.nodes {
        assert!(
            n.load <= status.capacity_per_node,
            "{} over capacity: {} > {}",
            n.node,
            n.load,
            status.capacity_per_node
        );
    }
}

/// Oversubscribed from many threads: exactly the capacity succeeds and
/// the rest fail cleanly.
#[test]
fn test_chbl_concurrent_exhaustion_is_exact() {
    let opts = loadring_router::Options {
        load_factor: 1.0,
        ..test_options(800)
    };
    let c = Arc::new(Cluster::new(Algorithm::Chbl, 4, &opts));

    let results: Vec<(usize, usize)> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let c = &c;
                s.spawn(move || {
                    let mut ok = 0;
                    let mut exhausted = 0;
                    for i in 0..150 {
                        match c.router.pick(format!("t{t}-{i}").as_bytes()) {
                            Ok(_) => ok += 1,
                            Err(RouterError::CapacityExhausted { .. }) => exhausted += 1,
                            Err(e) => panic!("unexpected error: {e}"),
                        }
                    }
                    (ok, exhausted)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let ok: usize = results.iter().map(|r| r.0).sum();
    let exhausted: usize = results.iter().map(|r| r.1).sum();
    assert_eq!(ok, 800);
    assert_eq!(exhausted, THREADS * 150 - 800);
}

/// Readers see either the old or the new mapping while a writer churns
/// membership, never an error or a node outside both sets.
#[test]
fn test_parallel_picks_during_rebuilds() {
    for algo in [Algorithm::Ring, Algorithm::Jump, Algorithm::Maglev] {
        let c = Cluster::new(algo, 4, &test_options(0));
        let keys = keys(2_000);
        let known = node_ids(0, 6);

        thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..20 {
                    c.add_nodes(4, 2);
                    c.remove_nodes(&["node-4", "node-5"]);
                }
            });
            for _ in 0..THREADS - 1 {
                s.spawn(|| {
                    for k in &keys {
                        let node = c.router.pick(k).unwrap();
                        assert!(known.contains(&node), "{algo}: unknown node {node}");
                    }
                });
            }
        });

        // Churn ends where it started.
        assert_eq!(c.nodes(), node_ids(0, 4), "{algo}");
    }
}

/// Picks from many threads agree with a single-threaded pass.
#[test]
fn test_parallel_picks_are_deterministic() {
    for algo in [Algorithm::Ring, Algorithm::Jump, Algorithm::Maglev] {
        let c = Cluster::new(algo, 5, &test_options(0));
        let keys = keys(5_000);
        let expected = c.assign(&keys);

        thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| assert_eq!(c.assign(&keys), expected, "{algo}"));
            }
        });
    }
}

#[test]
fn test_router_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<loadring_router::Router>();
    assert_send_sync::<Cluster>();

    let shared: Arc<dyn Mapper> = Arc::new(
        loadring_router::Router::new(Algorithm::Maglev, &test_options(0), &["a", "b"]).unwrap(),
    );
    let handle = {
        let shared = shared.clone();
        thread::spawn(move || shared.pick(b"k").unwrap())
    };
    assert_eq!(handle.join().unwrap(), shared.pick(b"k").unwrap());
}
