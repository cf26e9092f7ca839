//! Error types for the luck consensus core

use thiserror::Error;

/// Result type alias for luck consensus operations
pub type Result<T> = std::result::Result<T, LuckyBlockError>;

/// Errors that can occur while scoring, assembling or committing blocks
#[derive(Debug, Error)]
pub enum LuckyBlockError {
    /// Malformed block or transaction
    #[error("Validation failure: {0}")]
    ValidationFailure(String),

    /// Branch passed to block assembly had no tip
    #[error("Cannot generate a block from an empty branch")]
    EmptyBranch,

    /// No handler registered for a transaction or block type
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// A transaction handler reported failure during execution
    #[error("Execution of transaction {tx_hash} ({tx_type}) failed")]
    ExecutionFailure {
        /// Hash of the failing transaction
        tx_hash: String,
        /// Declared type of the failing transaction
        tx_type: String,
    },

    /// A decoded block references a transaction body nobody holds
    #[error("Transaction {0} is not available locally")]
    MissingTransaction(String),

    /// Underlying store open/submit/commit error
    #[error("Store failure: {0}")]
    StoreFailure(#[from] StoreError),

    /// Commit exceeded its deadline
    #[error("Commit of block {block_number} timed out after {timeout_ms}ms")]
    Timeout {
        /// Block number the store transaction was scoped to
        block_number: u64,
        /// Deadline that elapsed
        timeout_ms: u64,
    },

    /// Wire encoding error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl LuckyBlockError {
    /// Check if the caller may regenerate and resubmit after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::StoreFailure(_) | Self::Timeout { .. } | Self::MissingTransaction(_)
        )
    }

    /// Check if the error came from the commit path
    pub fn is_commit_failure(&self) -> bool {
        matches!(self, Self::StoreFailure(_) | Self::Timeout { .. })
    }
}

impl From<bincode::Error> for LuckyBlockError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors reported by a block store implementation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Could not open a transaction for the given block number
    #[error("Cannot open store transaction at block {0}")]
    OpenFailed(u64),

    /// Submitted block's parent is neither durable nor staged
    #[error("Unknown parent {parent} for block {block}")]
    UnknownParent {
        /// Block being submitted
        block: String,
        /// Missing parent id
        parent: String,
    },

    /// Submitted block's number does not follow its parent
    #[error("Invalid block number: expected {expected}, got {actual}")]
    InvalidNumber {
        /// Parent number + 1
        expected: u64,
        /// Number carried by the block
        actual: u64,
    },

    /// Finalizing the transaction failed
    #[error("Commit failed: {0}")]
    CommitFailed(String),

    /// Backend specific failure
    #[error("Backend error: {0}")]
    Backend(String),
}
