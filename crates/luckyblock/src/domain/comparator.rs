//! # Block Comparator
//!
//! Tournament that resolves competing blocks (usually same height, divergent
//! branches) to a single winner. Every honest node observing the same
//! candidate set must pick the same block regardless of arrival order.
//!
//! ## Rounds
//!
//! - Round 0: higher score wins, equal scores are undecided.
//! - Round r >= 1: `score + popcount(SHA256(id ++ decimal(r)))`, higher wins.
//!
//! Within a round, adjacent pairs are swept and losers eliminated until the
//! list stops shrinking. The survivors of a round are exactly the candidates
//! holding the maximal key for that round, so the outcome of every round,
//! and therefore the winner, does not depend on the input order.

use super::block::Block;
use super::scoring::{ones_count_256, sha256};
use std::borrow::Borrow;
use std::collections::HashSet;

/// Result of comparing two candidates in a round
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    First,
    Second,
    Undecided,
}

/// Tiebreak key of a block for rounds >= 1
pub fn tiebreak(block: &Block, round: u64) -> u64 {
    let digest = sha256(format!("{}{}", block.hash(), round).as_bytes());
    u64::from(block.score()) + u64::from(ones_count_256(&digest))
}

/// Compare two candidates in the given round.
pub fn compare(a: &Block, b: &Block, round: u64) -> Outcome {
    let (ka, kb) = if round == 0 {
        (u64::from(a.score()), u64::from(b.score()))
    } else {
        (tiebreak(a, round), tiebreak(b, round))
    };

    match ka.cmp(&kb) {
        std::cmp::Ordering::Greater => Outcome::First,
        std::cmp::Ordering::Less => Outcome::Second,
        std::cmp::Ordering::Equal => Outcome::Undecided,
    }
}

/// Pick the winning block, or `None` when there are no candidates.
///
/// Candidates sharing an id are the same block and are collapsed first,
/// since no tiebreak round could ever separate them.
pub fn select_winner<B: Borrow<Block>>(candidates: &[B]) -> Option<&B> {
    match candidates {
        [] => return None,
        [only] => return Some(only),
        _ => {}
    }

    let mut seen = HashSet::with_capacity(candidates.len());
    let mut working: Vec<&B> = candidates
        .iter()
        .filter(|c| seen.insert(as_block(*c).hash()))
        .collect();

    let mut round: u64 = 0;
    while working.len() > 1 {
        loop {
            let before = working.len();
            sweep(&mut working, round);
            if working.len() == before || working.len() == 1 {
                break;
            }
        }
        if working.len() > 1 {
            round += 1;
        }
    }

    working.pop()
}

fn as_block<B: Borrow<Block>>(candidate: &B) -> &Block {
    Borrow::<Block>::borrow(candidate)
}

fn sweep<B: Borrow<Block>>(working: &mut Vec<&B>, round: u64) {
    let mut i = 0;
    while i + 1 < working.len() {
        match compare(as_block(working[i]), as_block(working[i + 1]), round) {
            Outcome::First => {
                working.remove(i + 1);
            }
            Outcome::Second => {
                working.remove(i);
            }
            Outcome::Undecided => i += 1,
        }
    }
}
