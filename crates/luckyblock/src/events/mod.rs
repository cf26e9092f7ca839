//! Published events
//!
//! Observability events emitted by the generator. Delivery is handled by an
//! [`EventPublisher`](crate::ports::EventPublisher) adapter.

use crate::domain::BlockHash;
use serde::{Deserialize, Serialize};

/// Events published by a luck consensus node
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LuckyBlockEvent {
    /// A block was durably stored and every transaction in it executed
    BlockConfirmed {
        block_hash: BlockHash,
        block_number: u64,
        transaction_count: usize,
        /// Milliseconds since the Unix epoch
        confirmed_at: i64,
    },

    /// A transaction from the network was dropped at receipt
    TransactionDropped {
        transaction_type: String,
        reason: String,
    },
}

impl LuckyBlockEvent {
    pub fn is_confirmation(&self) -> bool {
        matches!(self, Self::BlockConfirmed { .. })
    }
}
