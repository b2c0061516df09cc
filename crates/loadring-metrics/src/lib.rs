//! Aggregate statistics over key-to-node assignments.
//!
//! - [`IntStats`] — count, mean, max, population standard deviation and
//!   coefficient of variation over per-node key counts.
//! - [`ChurnReport`] — how many keys changed node between two assignment
//!   passes.

mod churn;
mod stats;

pub use churn::{ChurnReport, NodeChurn};
pub use stats::{IntStats, compute_int_stats};
