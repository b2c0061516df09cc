//! Node and key generation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// `count` node IDs numbered from `start`: `node-{start}`, `node-{start+1}`, ...
pub fn node_names(start: usize, count: usize) -> Vec<String> {
    (start..start + count).map(|i| format!("node-{i}")).collect()
}

/// The key for index `i`.
pub fn key_name(i: usize) -> String {
    format!("key-{i}")
}

/// Zipf distribution over `0..n`, `P(k) ∝ 1 / (k + 1)^s`.
///
/// The CDF is precomputed once; each sample is a binary search.
pub struct ZipfSampler {
    cdf: Vec<f64>,
}

impl ZipfSampler {
    /// `n` must be > 0 and `s` > 0 and finite; callers validate both.
    pub fn new(n: usize, s: f64) -> Self {
        let mut cdf = Vec::with_capacity(n);
        let mut total = 0.0;
        for k in 0..n {
            total += 1.0 / ((k + 1) as f64).powf(s);
            cdf.push(total);
        }
        for c in &mut cdf {
            *c /= total;
        }
        Self { cdf }
    }

    /// Draw an index in `0..n`.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        let u: f64 = rng.random();
        let i = self.cdf.partition_point(|&c| c < u);
        // Rounding can leave the last entry a hair under 1.0.
        i.min(self.cdf.len() - 1)
    }
}

/// The key sequence routed by one simulation pass.
///
/// `zipf_s <= 0` gives `key-0..key-{count}` in order; otherwise `count`
/// Zipf-distributed draws from the same key space, reproducible from `seed`.
pub fn generate_keys(count: usize, zipf_s: f64, seed: u64) -> Vec<String> {
    if zipf_s <= 0.0 {
        return (0..count).map(key_name).collect();
    }
    let zipf = ZipfSampler::new(count, zipf_s);
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| key_name(zipf.sample(&mut rng))).collect()
}
