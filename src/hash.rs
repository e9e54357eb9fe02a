//! FNV-1a hashing
//!
//! Stable across runs and platforms, which `std`'s `DefaultHasher` is not.
//! Used for cache keys, cache file names and group keys.

const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const PRIME: u64 = 0x100000001b3;

/// FNV-1a 64-bit hash of a byte string
pub fn fnv64a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(OFFSET_BASIS, |hash, &b| {
        (hash ^ b as u64).wrapping_mul(PRIME)
    })
}
