//! Integration test: CH-BL bounded load.
//!
//! Checks the capacity bound against plain consistent hashing on the same
//! ring, under uniform and hot-key workloads.

use loadring_integration_tests::{Cluster, keys, test_options};
use loadring_metrics::compute_int_stats;
use loadring_router::{Algorithm, Mapper, Options, RouterError};

#[test]
fn test_bound_four_nodes_ten_thousand_keys() {
    let keys = keys(10_000);
    let c = Cluster::new(Algorithm::Chbl, 4, &test_options(10_000));
    let counts = c.counts(&c.assign(&keys));

    assert_eq!(counts.iter().sum::<usize>(), 10_000);
    let max = counts.iter().copied().max().unwrap();
    assert!(max <= 3125, "max load {max} exceeds ceil(1.25 * 10000 / 4)");

    let status = c.router.capacity_status().unwrap();
    assert_eq!(status.capacity_per_node, 3125);
    let loads: Vec<usize> = status.nodes.iter().map(|n| n.load).collect();
    assert_eq!(loads, counts);
}

/// CH-BL never does worse than plain ring hashing on the max load.
#[test]
fn test_chbl_max_not_above_ring() {
    let keys = keys(20_000);
    for nodes in [3, 8, 16] {
        let opts = Options {
            vnodes: 20,
            ..test_options(20_000)
        };
        let ring = Cluster::new(Algorithm::Ring, nodes, &opts);
        let chbl = Cluster::new(Algorithm::Chbl, nodes, &opts);

        let ring_stats = compute_int_stats(&ring.counts(&ring.assign(&keys)));
        let chbl_stats = compute_int_stats(&chbl.counts(&chbl.assign(&keys)));

        let cap = chbl.router.capacity_status().unwrap().capacity_per_node;
        assert!(chbl_stats.max <= cap, "{nodes} nodes: {} > {cap}", chbl_stats.max);
        assert!(
            chbl_stats.max <= ring_stats.max,
            "{nodes} nodes: chbl max {} vs ring max {}",
            chbl_stats.max,
            ring_stats.max
        );
    }
}

/// A single key repeated until every node is full, then one more.
#[test]
fn test_hot_key_fills_every_node_then_fails() {
    let opts = Options {
        load_factor: 1.0,
        ..test_options(300)
    };
    let c = Cluster::new(Algorithm::Chbl, 3, &opts);
    for _ in 0..300 {
        c.router.pick(b"hot").unwrap();
    }

    let status = c.router.capacity_status().unwrap();
    assert_eq!(status.capacity_per_node, 100);
    assert_eq!(status.at_capacity.len(), 3);

    let err = c.router.pick(b"hot").unwrap_err();
    assert_eq!(
        err,
        RouterError::CapacityExhausted {
            capacity_per_node: 100,
            nodes: 3
        }
    );
    // The failed pick committed nothing.
    assert_eq!(c.router.capacity_status().unwrap(), status);
}

#[test]
fn test_over_volume_surfaces_exhaustion() {
    let keys = keys(1_100);
    let opts = Options {
        load_factor: 1.0,
        ..test_options(1_000)
    };
    let c = Cluster::new(Algorithm::Chbl, 4, &opts);

    let mut placed = 0;
    let mut failed = 0;
    for k in &keys {
        match c.router.pick(k) {
            Ok(_) => placed += 1,
            Err(RouterError::CapacityExhausted { .. }) => failed += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(placed, 1_000);
    assert_eq!(failed, 100);
}

/// Unset `expected_keys` gives the documented degraded capacity.
#[test]
fn test_degraded_capacity_without_expected_keys() {
    let c = Cluster::new(Algorithm::Chbl, 4, &test_options(0));
    let status = c.router.capacity_status().unwrap();
    // ceil(1.25 * 4 / 4)
    assert_eq!(status.capacity_per_node, 2);

    for i in 0..8 {
        c.router.pick(format!("k-{i}").as_bytes()).unwrap();
    }
    assert!(c.router.pick(b"ninth").is_err());
}

#[test]
fn test_reset_loads_via_rebuild() {
    let keys = keys(1_000);
    let c = Cluster::new(Algorithm::Chbl, 2, &test_options(1_000));
    c.assign(&keys);

    c.add_nodes(2, 1);
    c.remove_nodes(&["node-2"]);
    let status = c.router.capacity_status().unwrap();
    assert!(status.nodes.iter().all(|n| n.load == 0));
    assert!(status.at_capacity.is_empty());
}
