//! Admissible bucket counts.
//!
//! The table only ever uses bucket counts drawn from a fixed ascending
//! ladder of precomputed primes (roughly 1.5x apart). Prime counts keep
//! `hash % bucket_count` well distributed even for hash functions with
//! structured low bits; the ladder spacing bounds the number of rehashes
//! over any growth sequence.

/// Ascending ladder of prime bucket counts. Each entry is the next prime
/// at or above 1.5x its predecessor, capped just under `u32::MAX` so the
/// ladder is valid on 32-bit targets too.
pub const ADMISSIBLE_SIZES: &[usize] = &[
    5,
    7,
    11,
    17,
    29,
    47,
    71,
    107,
    163,
    251,
    379,
    569,
    857,
    1_289,
    1_949,
    2_927,
    4_391,
    6_599,
    9_901,
    14_867,
    22_303,
    33_457,
    50_207,
    75_323,
    112_997,
    169_501,
    254_257,
    381_389,
    572_087,
    858_149,
    1_287_233,
    1_930_879,
    2_896_319,
    4_344_479,
    6_516_739,
    9_775_111,
    14_662_727,
    21_994_111,
    32_991_187,
    49_486_793,
    74_230_231,
    111_345_347,
    167_018_021,
    250_527_047,
    375_790_601,
    563_685_907,
    845_528_867,
    1_268_293_309,
    1_902_439_967,
    2_853_659_981,
    4_280_489_981,
];

/// Bucket count used by `ChainedHashTable::new`.
pub const DEFAULT_BUCKET_COUNT: usize = ADMISSIBLE_SIZES[0];

/// Smallest admissible size `>= lower_bound`, or `None` when the ladder
/// is exhausted. Binary search over the ascending ladder.
pub fn next_size(lower_bound: usize) -> Option<usize> {
    let idx = ADMISSIBLE_SIZES.partition_point(|&s| s < lower_bound);
    ADMISSIBLE_SIZES.get(idx).copied()
}
