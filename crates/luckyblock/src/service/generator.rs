//! # Block Generator
//!
//! Owns the node's outstanding pool, handler registry and committer, and
//! drives the block lifecycle:
//!
//! ```text
//! network ──receive_transaction──→ [pool]
//!                                     │ remainder(branch)
//!                                     ↓
//!        generate_block(branch) ──→ BlockDraft ──seal──→ Block
//!                                                          │
//!              try_commit_block (dry run) / confirm_block (durable)
//!                                                          │
//!                         commit_block: execute all ──→ unlog from pool
//! ```
//!
//! In luckyblock there is no work to do when generating a block; blocks are
//! ranked by their score alone.

use crate::config::LuckyBlockConfig;
use crate::domain::{
    now_millis, Block, BlockDraft, BlockHash, HandlerRegistry, NetworkMessage, SharedTransaction,
    TransactionHandler, TransactionPool, TxHash,
};
use crate::error::{LuckyBlockError, Result};
use crate::events::LuckyBlockEvent;
use crate::ports::{BlockGeneratorApi, BlockStore, EventPublisher};
use crate::service::BlockCommitter;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

type Resolved = (SharedTransaction, Arc<dyn TransactionHandler>);

/// Block generator for one node identity
pub struct BlockGenerator<S, E>
where
    S: BlockStore,
    E: EventPublisher,
{
    config: LuckyBlockConfig,
    pool: Arc<TransactionPool>,
    handlers: HandlerRegistry,
    committer: BlockCommitter<S>,
    events: Arc<E>,
}

impl<S, E> BlockGenerator<S, E>
where
    S: BlockStore + 'static,
    E: EventPublisher + 'static,
{
    /// Create a generator with a fresh, empty pool.
    pub fn new(
        config: LuckyBlockConfig,
        handlers: HandlerRegistry,
        store: Arc<S>,
        events: Arc<E>,
    ) -> Self {
        info!(
            peer_id = %config.peer_id,
            block_type = %config.block.block_type,
            handlers = handlers.len(),
            "[luckyblock] Initializing block generator"
        );

        let committer = BlockCommitter::new(store, config.commit_timeout());

        Self {
            config,
            pool: Arc::new(TransactionPool::new()),
            handlers,
            committer,
            events,
        }
    }

    /// Share an existing pool instead of creating one
    pub fn with_pool(mut self, pool: Arc<TransactionPool>) -> Self {
        self.pool = pool;
        self
    }

    pub fn config(&self) -> &LuckyBlockConfig {
        &self.config
    }

    pub fn pool(&self) -> &Arc<TransactionPool> {
        &self.pool
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn committer(&self) -> &BlockCommitter<S> {
        &self.committer
    }

    pub fn peer_id(&self) -> &str {
        &self.config.peer_id
    }

    /// Union of transaction hashes across every block of a branch
    pub fn branch_transaction_hashes(branch: &[Block]) -> HashSet<TxHash> {
        branch
            .iter()
            .flat_map(|b| b.transaction_hashes().iter().cloned())
            .collect()
    }

    /// Durably commit `block`, then execute it and clear its transactions.
    pub async fn confirm_block(&self, block: &Block) -> Result<BlockHash> {
        let hash = self.committer.commit(block).await?;
        self.commit_block(block).await?;
        Ok(hash)
    }

    async fn drop_transaction(&self, message: &NetworkMessage, reason: String) {
        warn!(
            transaction_type = %message.transaction_type,
            from = %message.from,
            reason = %reason,
            "[luckyblock] Dropping transaction"
        );

        let event = LuckyBlockEvent::TransactionDropped {
            transaction_type: message.transaction_type.clone(),
            reason,
        };
        if let Err(e) = self.events.publish(event).await {
            warn!(error = %e, "[luckyblock] Failed to publish drop event");
        }
    }

    /// Pair every transaction of `block` with its handler, resolving bodies
    /// from the pool for blocks decoded off the wire.
    fn resolve(&self, block: &Block) -> Result<Vec<Resolved>> {
        block
            .transaction_hashes()
            .iter()
            .enumerate()
            .map(|(i, hash)| -> Result<Resolved> {
                let txn = match block.transactions().get(i) {
                    Some(txn) => txn.clone(),
                    None => self
                        .pool
                        .get(hash)
                        .ok_or_else(|| LuckyBlockError::MissingTransaction(hash.clone()))?,
                };
                let handler = self
                    .handlers
                    .get(txn.type_name())
                    .cloned()
                    .ok_or_else(|| LuckyBlockError::UnknownType(txn.type_name().to_string()))?;
                Ok((txn, handler))
            })
            .collect()
    }
}

#[async_trait]
impl<S, E> BlockGeneratorApi for BlockGenerator<S, E>
where
    S: BlockStore + 'static,
    E: EventPublisher + 'static,
{
    fn block_type(&self) -> &str {
        &self.config.block.block_type
    }

    fn block_prototype(&self) -> Result<Block> {
        Block::prototype(&self.config.block)
    }

    fn generate_genesis_block(&self) -> Result<Block> {
        let genesis = BlockDraft::new(&self.config.block, None, &self.config.peer_id).seal()?;
        info!(block_hash = %genesis.hash(), "[luckyblock] Generated genesis block");
        Ok(genesis)
    }

    fn generate_block(&self, branch: &[Block]) -> Result<BlockDraft> {
        let head = branch.first().ok_or(LuckyBlockError::EmptyBranch)?;

        let confirmed = Self::branch_transaction_hashes(branch);
        let payload = self.pool.remainder(&confirmed);

        debug!(
            parent = %head.hash(),
            block_number = head.block_number() + 1,
            branch_len = branch.len(),
            payload = payload.len(),
            "[luckyblock] Assembled candidate block"
        );

        let mut draft = BlockDraft::new(&self.config.block, Some(head), &self.config.peer_id);
        draft.set_transactions(payload);
        Ok(draft)
    }

    async fn receive_transaction(&self, message: &NetworkMessage) -> Option<SharedTransaction> {
        let Some(handler) = self.handlers.get(&message.transaction_type) else {
            self.drop_transaction(message, "unknown transaction type".to_string())
                .await;
            return None;
        };

        match handler.receive_transaction(message) {
            Ok(txn) => {
                if !self.pool.log_transaction(txn.clone()) {
                    debug!(tx_hash = %txn.hash(), "[luckyblock] Transaction already outstanding");
                }
                Some(txn)
            }
            Err(e) => {
                self.drop_transaction(message, e.to_string()).await;
                None
            }
        }
    }

    async fn try_commit_block(&self, block: &Block, branch: &[Block]) -> bool {
        self.committer.try_commit(block, branch).await.is_ok()
    }

    async fn commit_block(&self, block: &Block) -> Result<()> {
        // Resolve everything up front so a missing handler never leaves the
        // block half executed
        let resolved = self.resolve(block)?;

        for (txn, handler) in &resolved {
            if !handler.execute(txn.as_ref()) {
                warn!(
                    block_hash = %block.hash(),
                    tx_hash = %txn.hash(),
                    "[luckyblock] Transaction execution failed, block not confirmed"
                );
                return Err(LuckyBlockError::ExecutionFailure {
                    tx_hash: txn.hash(),
                    tx_type: txn.type_name().to_string(),
                });
            }
        }

        let removed = self.pool.unlog_transactions(block.transaction_hashes());

        info!(
            block_hash = %block.hash(),
            block_number = block.block_number(),
            transactions = resolved.len(),
            removed,
            "[luckyblock] Block confirmed"
        );

        // The block is already executed; a lost event must not report it failed
        let event = LuckyBlockEvent::BlockConfirmed {
            block_hash: block.hash().to_string(),
            block_number: block.block_number(),
            transaction_count: resolved.len(),
            confirmed_at: now_millis(),
        };
        if let Err(e) = self.events.publish(event).await {
            warn!(
                block_hash = %block.hash(),
                error = %e,
                "[luckyblock] Failed to publish confirmation event"
            );
        }
        Ok(())
    }
}
