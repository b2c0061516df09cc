//! Integration test: membership churn.
//!
//! Routes the same key set before and after adding or removing nodes and
//! checks how many keys moved, per algorithm.

use loadring_integration_tests::{Cluster, keys, test_options};
use loadring_metrics::ChurnReport;
use loadring_router::{Algorithm, Mapper};

const KEYS: usize = 10_000;

fn churn_after_add(algo: Algorithm, from: usize) -> ChurnReport {
    let keys = keys(KEYS);
    let c = Cluster::new(algo, from, &test_options(KEYS));
    let before = c.assign(&keys);
    c.add_nodes(from, 1);
    let after = c.assign(&keys);
    ChurnReport::compute(&c.nodes(), &before, &after)
}

/// Ring, jump and Maglev: growing 4 -> 5 moves roughly 1/5 of the keys,
/// and every moved key lands on the new node.
#[test]
fn test_add_moves_about_one_fifth() {
    for algo in [Algorithm::Ring, Algorithm::Jump, Algorithm::Maglev] {
        let keys = keys(KEYS);
        let c = Cluster::new(algo, 4, &test_options(KEYS));
        let before = c.assign(&keys);
        c.add_nodes(4, 1);
        let after = c.assign(&keys);

        let report = ChurnReport::compute(&c.nodes(), &before, &after);
        assert!(
            (0.10..=0.35).contains(&report.moved_ratio),
            "{algo}: moved ratio {:.3}",
            report.moved_ratio
        );

        if algo != Algorithm::Maglev {
            // Maglev may shuffle a few slots between old nodes; the
            // others never do.
            for (b, a) in before.iter().zip(&after) {
                if b != a {
                    assert_eq!(a, "node-4", "{algo}: key moved {b} -> {a}");
                }
            }
        }
    }
}

#[test]
fn test_jump_three_to_four() {
    let report = churn_after_add(Algorithm::Jump, 3);
    assert!(report.moved_ratio <= 0.40, "ratio {:.3}", report.moved_ratio);
    assert!(report.moved_ratio >= 0.15, "ratio {:.3}", report.moved_ratio);
    assert_eq!(report.nodes.len(), 4);
    assert_eq!(report.nodes[3].before, 0);
    assert_eq!(report.nodes[3].after, report.moved);
}

/// Removing a node only relocates the keys it owned.
#[test]
fn test_remove_moves_owned_keys() {
    for algo in [Algorithm::Ring, Algorithm::Maglev] {
        let keys = keys(KEYS);
        let c = Cluster::new(algo, 5, &test_options(KEYS));
        let all_nodes = c.nodes();
        let before = c.assign(&keys);
        c.remove_nodes(&["node-2"]);
        let after = c.assign(&keys);

        let report = ChurnReport::compute(&all_nodes, &before, &after);
        let owned = report.nodes[2].before;
        assert_eq!(report.nodes[2].after, 0, "{algo}");
        if algo == Algorithm::Ring {
            assert_eq!(report.moved, owned);
        } else {
            // Maglev keeps most, not all, of the surviving slots.
            assert!(report.moved >= owned, "{algo}");
            assert!(report.moved < owned * 2, "{algo}: moved {}", report.moved);
        }
    }
}

/// Jump only handles removal of the last node gracefully.
#[test]
fn test_jump_remove_last_node() {
    let keys = keys(KEYS);
    let c = Cluster::new(Algorithm::Jump, 5, &test_options(KEYS));
    let all_nodes = c.nodes();
    let before = c.assign(&keys);
    c.remove_nodes(&["node-4"]);
    let after = c.assign(&keys);

    let report = ChurnReport::compute(&all_nodes, &before, &after);
    assert_eq!(report.moved, report.nodes[4].before);
}

/// Re-adding a removed node restores the earlier ring mapping, since
/// token positions only depend on the node ID.
#[test]
fn test_ring_remove_then_readd_restores_assignment() {
    let keys = keys(KEYS);
    let c = Cluster::new(Algorithm::Ring, 4, &test_options(KEYS));
    let before = c.assign(&keys);
    c.remove_nodes(&["node-1"]);
    c.add_nodes(1, 1);
    assert_eq!(c.assign(&keys), before);
}

/// CH-BL churn: the rebuild resets loads, so the second pass is bounded
/// on its own and every key is placed again.
#[test]
fn test_chbl_churn_reassigns_within_capacity() {
    let keys = keys(KEYS);
    let c = Cluster::new(Algorithm::Chbl, 4, &test_options(KEYS));
    let before = c.assign(&keys);
    c.add_nodes(4, 1);

    let status = c.router.capacity_status().unwrap();
    assert!(status.nodes.iter().all(|n| n.load == 0));
    // ceil(1.25 * 10000 / 5)
    assert_eq!(status.capacity_per_node, 2500);

    let after = c.assign(&keys);
    let counts = c.counts(&after);
    assert_eq!(counts.iter().sum::<usize>(), KEYS);
    assert!(counts.iter().all(|&n| n <= 2500), "{counts:?}");

    let report = ChurnReport::compute(&c.nodes(), &before, &after);
    assert!(report.moved > 0);
    assert!(report.moved_ratio < 0.6, "ratio {:.3}", report.moved_ratio);
}

/// Idempotent edits leave every algorithm's assignment untouched.
#[test]
fn test_noop_edits_do_not_churn() {
    for algo in [Algorithm::Ring, Algorithm::Jump, Algorithm::Maglev] {
        let keys = keys(2_000);
        let c = Cluster::new(algo, 4, &test_options(2_000));
        let before = c.assign(&keys);
        c.add_nodes(0, 2);
        c.remove_nodes(&["node-99"]);
        let report = ChurnReport::compute(&c.nodes(), &before, &c.assign(&keys));
        assert_eq!(report.moved, 0, "{algo}");
    }
}
