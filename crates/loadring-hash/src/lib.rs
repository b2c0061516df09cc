//! Seeded 64-bit hash primitive.
//!
//! Every mapper in the workspace places nodes and keys with [`hash64`]:
//! BLAKE3 over `seed.to_le_bytes() ++ data`, truncated to the first 8 digest
//! bytes (little-endian). The output is stable across processes and
//! platforms, and two different seeds over the same data give unrelated
//! values, which is what Maglev's offset/skip streams and CH-BL's
//! primary/fallback candidates rely on.

/// Hash arbitrary bytes under `seed`.
pub fn hash64(data: &[u8], seed: u64) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&seed.to_le_bytes());
    hasher.update(data);
    truncate(hasher.finalize())
}

/// Convenience wrapper for string keys and node IDs.
pub fn hash64_str(s: &str, seed: u64) -> u64 {
    hash64(s.as_bytes(), seed)
}

fn truncate(hash: blake3::Hash) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}
