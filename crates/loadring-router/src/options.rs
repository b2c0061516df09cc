//! Shared mapper configuration and algorithm selection.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RouterError;

/// Default virtual nodes per physical node (ring and CH-BL).
pub const DEFAULT_VNODES: usize = 100;

/// Default Maglev lookup table size. Prime, and much larger than any
/// expected node count.
pub const DEFAULT_TABLE_SIZE: usize = 65537;

/// Largest accepted Maglev table size. Each table entry is a `usize`, so
/// this caps the lookup table at 512 MiB on 64-bit targets.
pub const MAX_TABLE_SIZE: usize = 1 << 26;

/// Default CH-BL load factor `c`.
pub const DEFAULT_LOAD_FACTOR: f64 = 1.25;

/// Default number of CH-BL walk steps before the two-choice fallback.
pub const DEFAULT_WALK_THRESHOLD: usize = 8;

/// Mapping strategy identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Plain consistent hashing over a vnode ring.
    Ring,
    /// Jump consistent hashing.
    Jump,
    /// Maglev permutation table.
    Maglev,
    /// Consistent hashing with bounded loads.
    Chbl,
}

impl Algorithm {
    /// Every supported algorithm, in a stable order.
    pub const ALL: [Algorithm; 4] = [
        Algorithm::Ring,
        Algorithm::Jump,
        Algorithm::Maglev,
        Algorithm::Chbl,
    ];

    /// The identifier accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Ring => "ring",
            Algorithm::Jump => "jump",
            Algorithm::Maglev => "maglev",
            Algorithm::Chbl => "chbl",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RouterError::UnknownAlgorithm(s.to_string()))
    }
}

/// Configuration shared by all mappers.
///
/// Not every field applies to every algorithm; unused fields are ignored.
/// Deserializes from a partial TOML/JSON table, filling the rest from
/// [`Options::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Virtual nodes per physical node (ring, CH-BL). Must be > 0.
    pub vnodes: usize,
    /// Maglev lookup table size `M`. Must be prime and at most
    /// [`MAX_TABLE_SIZE`].
    pub table_size: usize,
    /// CH-BL load factor `c >= 1.0`: per-node capacity is
    /// `ceil(c * expected_keys / nodes)`.
    pub load_factor: f64,
    /// Expected total number of CH-BL assignments between rebuilds.
    ///
    /// 0 means unset: capacity then degrades to `ceil(c)` keys per node,
    /// which only suits toy workloads. Supply a real estimate.
    pub expected_keys: usize,
    /// CH-BL walk steps before consulting the second hash candidate.
    /// 0 disables the fallback.
    pub walk_threshold: usize,
    /// Seed shared by all hash streams. A fixed seed makes the mapping
    /// reproducible across processes for the same node set.
    pub hash_seed: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            vnodes: DEFAULT_VNODES,
            table_size: DEFAULT_TABLE_SIZE,
            load_factor: DEFAULT_LOAD_FACTOR,
            expected_keys: 0,
            walk_threshold: DEFAULT_WALK_THRESHOLD,
            hash_seed: 0,
        }
    }
}

impl Options {
    pub(crate) fn checked_vnodes(&self) -> Result<NonZeroUsize, RouterError> {
        NonZeroUsize::new(self.vnodes).ok_or(RouterError::InvalidVnodes)
    }

    pub(crate) fn checked_load_factor(&self) -> Result<f64, RouterError> {
        // Written so that NaN is rejected too.
        if self.load_factor >= 1.0 && self.load_factor.is_finite() {
            Ok(self.load_factor)
        } else {
            Err(RouterError::InvalidLoadFactor(self.load_factor))
        }
    }

    pub(crate) fn checked_table_size(&self) -> Result<usize, RouterError> {
        if self.table_size <= MAX_TABLE_SIZE && is_prime(self.table_size) {
            Ok(self.table_size)
        } else {
            Err(RouterError::InvalidTableSize(self.table_size))
        }
    }
}

/// Trial division. Callers bound `n` by [`MAX_TABLE_SIZE`] first.
fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3;
    while d <= n / d {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}
