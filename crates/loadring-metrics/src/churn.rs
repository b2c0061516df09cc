//! Key movement between two assignment passes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Key counts for one node before and after a membership change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeChurn {
    pub node: String,
    pub before: usize,
    pub after: usize,
}

/// Comparison of two assignment passes over the same key sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnReport {
    /// One row per node in `nodes` order.
    pub nodes: Vec<NodeChurn>,
    /// Keys compared.
    pub keys: usize,
    /// Keys whose node changed.
    pub moved: usize,
    /// `moved / keys`, 0 when no keys were compared.
    pub moved_ratio: f64,
}

impl ChurnReport {
    /// Compare `before[i]` with `after[i]` for every key `i`.
    ///
    /// `nodes` fixes the row order and should cover both node sets; nodes
    /// that appear in the assignments but not in `nodes` still count
    /// towards `moved`. If the slices differ in length only the common
    /// prefix is compared.
    pub fn compute<N, A>(nodes: &[N], before: &[A], after: &[A]) -> Self
    where
        N: AsRef<str>,
        A: AsRef<str>,
    {
        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        let mut keys = 0;
        let mut moved = 0;

        for (b, a) in before.iter().zip(after) {
            let (b, a) = (b.as_ref(), a.as_ref());
            keys += 1;
            if b != a {
                moved += 1;
            }
            counts.entry(b).or_default().0 += 1;
            counts.entry(a).or_default().1 += 1;
        }

        let nodes = nodes
            .iter()
            .map(|n| {
                let n = n.as_ref();
                let (before, after) = counts.get(n).copied().unwrap_or_default();
                NodeChurn {
                    node: n.to_string(),
                    before,
                    after,
                }
            })
            .collect();

        let moved_ratio = if keys == 0 {
            0.0
        } else {
            moved as f64 / keys as f64
        };

        Self {
            nodes,
            keys,
            moved,
            moved_ratio,
        }
    }
}
