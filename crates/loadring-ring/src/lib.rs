//! Virtual-node token ring for consistent hashing.
//!
//! This crate implements the sorted token ring shared by the plain
//! consistent-hashing mapper and the bounded-load (CH-BL) mapper. Each
//! physical node gets `vnodes` positions on a `u64` ring, determined by
//! `hash64("<node>#<vnode>-<seed>", seed)`. A key is owned by the first
//! token at or after its own position, wrapping past the end.
//!
//! More vnodes per node = more uniform distribution, at the cost of memory
//! and rebuild time.

mod error;
mod ring;

pub use error::RingError;
pub use ring::{Ring, Token, dedup_nodes};
