//! # Block Committer
//!
//! Transactional persistence on top of the [`BlockStore`] port.
//!
//! | Operation | Store effect |
//! |-----------|--------------|
//! | `try_commit` | replay branch oldest-first, submit block, always revert |
//! | `commit` | submit block, finalize; revert on submit failure |
//!
//! Both operations share one lock, so at most one is in flight per node, and
//! both are bounded by the same deadline. A timed-out operation still reverts
//! before returning.

use crate::domain::{Block, BlockHash};
use crate::error::{LuckyBlockError, Result};
use crate::ports::{BlockStore, StoreTransaction};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};

/// Serialized, time-bounded committer
pub struct BlockCommitter<S: BlockStore> {
    store: Arc<S>,
    lock: Mutex<()>,
    timeout: Duration,
}

impl<S: BlockStore> BlockCommitter<S> {
    pub fn new(store: Arc<S>, timeout: Duration) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
            timeout,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Validate `new_block` on top of `branch` (tip first) without leaving
    /// any durable state. Returns the content hash the block would get.
    pub async fn try_commit(&self, new_block: &Block, branch: &[Block]) -> Result<BlockHash> {
        let _guard = self.lock.lock().await;
        let deadline = Instant::now() + self.timeout;
        let number = new_block.block_number();

        let mut txn = self.open(number, deadline).await?;

        let outcome = timeout_at(deadline, replay(txn.as_mut(), new_block, branch)).await;
        txn.revert().await;

        match outcome {
            Ok(Ok(hash)) => {
                debug!(
                    block_number = number,
                    block_hash = %hash,
                    branch_len = branch.len(),
                    "[luckyblock] Dry-run commit succeeded"
                );
                Ok(hash)
            }
            Ok(Err(e)) => {
                debug!(block_number = number, error = %e, "[luckyblock] Dry-run commit rejected");
                Err(e.into())
            }
            Err(_) => Err(self.timed_out(number)),
        }
    }

    /// Durably store a single block and return its content hash.
    pub async fn commit(&self, block: &Block) -> Result<BlockHash> {
        let _guard = self.lock.lock().await;
        let deadline = Instant::now() + self.timeout;
        let number = block.block_number();

        let mut txn = self.open(number, deadline).await?;

        let hash = match timeout_at(deadline, txn.submit(block)).await {
            Ok(Ok(hash)) => hash,
            Ok(Err(e)) => {
                warn!(block_number = number, error = %e, "[luckyblock] Submit failed, reverting");
                txn.revert().await;
                return Err(e.into());
            }
            Err(_) => {
                txn.revert().await;
                return Err(self.timed_out(number));
            }
        };

        match timeout_at(deadline, txn.commit()).await {
            Ok(Ok(())) => {
                info!(block_number = number, block_hash = %hash, "[luckyblock] Block committed");
                Ok(hash)
            }
            Ok(Err(e)) => {
                // Submitted data is not guaranteed durable at this point
                error!(block_number = number, error = %e, "[luckyblock] Store commit failed");
                Err(e.into())
            }
            Err(_) => {
                txn.revert().await;
                Err(self.timed_out(number))
            }
        }
    }

    async fn open(&self, number: u64, deadline: Instant) -> Result<Box<dyn StoreTransaction>> {
        match timeout_at(deadline, self.store.open_block(number)).await {
            Ok(Ok(txn)) => Ok(txn),
            Ok(Err(e)) => {
                warn!(block_number = number, error = %e, "[luckyblock] Cannot open store transaction");
                Err(e.into())
            }
            Err(_) => Err(self.timed_out(number)),
        }
    }

    fn timed_out(&self, block_number: u64) -> LuckyBlockError {
        let timeout_ms = self.timeout.as_millis() as u64;
        warn!(block_number, timeout_ms, "[luckyblock] Commit deadline exceeded");
        LuckyBlockError::Timeout {
            block_number,
            timeout_ms,
        }
    }
}

/// Replay `branch` oldest ancestor first, then submit `block`.
///
/// Later blocks may depend on earlier ones already being staged.
async fn replay(
    txn: &mut dyn StoreTransaction,
    block: &Block,
    branch: &[Block],
) -> std::result::Result<BlockHash, crate::error::StoreError> {
    for ancestor in branch.iter().rev() {
        txn.submit(ancestor).await?;
    }
    txn.submit(block).await
}
