//! Driven ports (Outbound dependencies)
//!
//! The content-addressed block store and the event sink are owned by the
//! host; the core only sees these traits.

use crate::domain::{Block, BlockHash};
use crate::error::StoreError;
use crate::events::LuckyBlockEvent;
use async_trait::async_trait;

/// Content-addressed block store
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Open a transaction scoped to the given block number.
    async fn open_block(&self, block_number: u64)
        -> Result<Box<dyn StoreTransaction>, StoreError>;
}

/// Open store transaction.
///
/// Nothing submitted is durable until [`commit`](Self::commit) succeeds;
/// [`revert`](Self::revert) discards everything staged.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Stage a block, returning its content hash.
    async fn submit(&mut self, block: &Block) -> Result<BlockHash, StoreError>;

    /// Make every staged block durable.
    async fn commit(&mut self) -> Result<(), StoreError>;

    /// Discard staged blocks. Safe to call more than once.
    async fn revert(&mut self);
}

/// Sink for observability events
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: LuckyBlockEvent) -> Result<(), String>;
}
