//! Application services: the block generator and its committer

mod committer;
mod generator;

pub use committer::BlockCommitter;
pub use generator::BlockGenerator;
