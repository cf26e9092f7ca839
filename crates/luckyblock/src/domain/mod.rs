//! Domain layer: blocks, scoring, fork choice and the outstanding pool

mod block;
pub mod comparator;
mod pool;
mod registry;
pub mod scoring;
mod transaction;

pub use block::*;
pub use comparator::{select_winner, Outcome};
pub use pool::*;
pub use registry::*;
pub use scoring::compute_score;
pub use transaction::*;
