//! Key-to-node mappers sharing one contract.
//!
//! This crate provides:
//!
//! - [`Mapper`] — the `add` / `remove` / `pick` contract every strategy
//!   implements.
//! - [`RingMapper`] — plain consistent hashing over a vnode ring.
//! - [`JumpMapper`] — Lamping–Veach jump consistent hashing.
//! - [`MaglevMapper`] — Maglev permutation lookup table.
//! - [`ChblMapper`] — consistent hashing with bounded loads (CH-BL).
//! - [`Router`] — the closed set of the four strategies, selected by an
//!   [`Algorithm`] and a shared [`Options`] structure.
//!
//! Ring, jump and Maglev picks are pure reads and run in parallel under a
//! read lock. CH-BL picks increment per-node load counters, so they are
//! serialized behind one mutex and are **not idempotent**: the same key can
//! land on a different node once its first choice fills up.

mod chbl;
mod error;
mod jump;
mod maglev;
mod mapper;
mod options;
mod ring_mapper;
mod router;

pub use chbl::{CHBL_FALLBACK_SEED_MIX, CapacityStatus, ChblMapper, NodeLoad};
pub use error::RouterError;
pub use jump::{JUMP_MULTIPLIER, JumpMapper, jump_bucket};
pub use maglev::{MAGLEV_SKIP_SEED_MIX, MaglevMapper};
pub use mapper::Mapper;
pub use options::{
    Algorithm, DEFAULT_LOAD_FACTOR, DEFAULT_TABLE_SIZE, DEFAULT_VNODES, DEFAULT_WALK_THRESHOLD,
    MAX_TABLE_SIZE, Options,
};
pub use ring_mapper::RingMapper;
pub use router::Router;
