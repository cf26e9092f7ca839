//! # Block Scoring
//!
//! A block's luck is derived from who proposed it and which parent it
//! extends. There is no nonce, so the score cannot be mined; any observer who
//! knows the two inputs can recompute it.
//!
//! ```text
//! score = 1
//! repeat 4 times:
//!     bits  = popcount(SHA256(peer_id ++ parent_id ++ hex(score)))
//!     score = score * max(bits, 1)
//! score > u32::MAX  =>  0
//! ```

use sha2::{Digest, Sha256};

/// Number of hash-and-multiply repetitions
pub const SCORE_REPETITIONS: usize = 4;

/// Largest representable score
pub const MAX_SCORE: u64 = u32::MAX as u64;

/// Compute SHA-256 hash of data
#[inline]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Count set bits across a 32-byte digest
#[inline]
pub fn ones_count_256(digest: &[u8; 32]) -> u32 {
    digest.iter().map(|b| b.count_ones()).sum()
}

/// Compute the luck score for a proposer extending a parent.
pub fn compute_score(peer_id: &str, parent_id: &str) -> u32 {
    let mut score: u64 = 1;

    for _ in 0..SCORE_REPETITIONS {
        let input = format!("{peer_id}{parent_id}{score:x}");
        score = multiply_count(score, ones_count_256(&sha256(input.as_bytes())));
    }

    clamp_score(score)
}

/// Fold a sequence of per-round popcounts into a final score.
pub fn fold_counts(counts: [u32; SCORE_REPETITIONS]) -> u32 {
    clamp_score(counts.into_iter().fold(1, multiply_count))
}

/// A zero popcount must never collapse the product
#[inline]
fn multiply_count(score: u64, count: u32) -> u64 {
    score * u64::from(count.max(1))
}

/// Only exceeded when every round hashed to all ones: 256^4 == 2^32
#[inline]
fn clamp_score(score: u64) -> u32 {
    if score > MAX_SCORE {
        0
    } else {
        score as u32
    }
}
