//! Deterministic per-cell hash.
//!
//! Pure function of position and seed, used for the cosmetic per-voxel
//! jitter seed assigned at grid initialization.

/// Jitter seed for the cell at `(x, y)` in a level generated from `seed`.
///
/// Packs the cell into one 64-bit word, offsets it by the seed and runs the
/// SplitMix64 finalizer. The high half is returned.
pub fn cell_hash(x: i32, y: i32, seed: u32) -> u32 {
    let cell = ((x as u32 as u64) << 32) | y as u32 as u64;
    let mut z = cell ^ (seed as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 32) as u32
}

/// Map a cell hash to a jitter value in [0, 1).
pub fn hash_to_unit(hash: u32) -> f32 {
    (hash >> 8) as f32 / 16_777_216.0 // 2^24
}
