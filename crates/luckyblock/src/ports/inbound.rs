//! Driving ports (Inbound API)

use crate::domain::{Block, BlockDraft, NetworkMessage, SharedTransaction};
use crate::error::Result;
use async_trait::async_trait;

/// Block generator API consumed by the host's chain manager.
///
/// Branches are ordered tip first.
#[async_trait]
pub trait BlockGeneratorApi: Send + Sync {
    /// Key under which the host registers this generator
    fn block_type(&self) -> &str;

    /// Empty, parentless block used to decode wire blocks of this type
    fn block_prototype(&self) -> Result<Block>;

    /// Sealed parentless block for chain bootstrap
    fn generate_genesis_block(&self) -> Result<Block>;

    /// Unsealed child of `branch[0]` carrying the pool remainder
    fn generate_block(&self, branch: &[Block]) -> Result<BlockDraft>;

    /// Dispatch a network transaction to its handler and log it.
    ///
    /// Unknown types and handler rejections are logged and dropped.
    async fn receive_transaction(&self, message: &NetworkMessage) -> Option<SharedTransaction>;

    /// Dry-run `block` on top of `branch`; never leaves durable state
    async fn try_commit_block(&self, block: &Block, branch: &[Block]) -> bool;

    /// Execute every transaction of a confirmed block and clear them from
    /// the pool, all or nothing.
    async fn commit_block(&self, block: &Block) -> Result<()>;
}
