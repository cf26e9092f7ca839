//! Transaction capabilities
//!
//! Transactions are opaque to the consensus core. Behavior is selected by the
//! declared type name, which keys into a [`HandlerRegistry`](super::HandlerRegistry).

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// Hex-encoded content hash of a transaction
pub type TxHash = String;

/// A transaction carried in block payloads
pub trait Transaction: Debug + Send + Sync {
    /// Content hash, unique per transaction
    fn hash(&self) -> TxHash;

    /// Declared type name used for handler dispatch
    fn type_name(&self) -> &str;

    /// Wire bytes understood by this type's handler
    fn marshal(&self) -> Result<Vec<u8>>;
}

/// Shared handle to a transaction
pub type SharedTransaction = Arc<dyn Transaction>;

/// Transaction as delivered by the network layer
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkMessage {
    /// Declared transaction type, used to pick a handler
    pub transaction_type: String,
    /// Protocol the message arrived on
    pub protocol: String,
    /// Sending peer
    pub from: String,
    /// Handler specific payload
    pub payload: Vec<u8>,
}

impl NetworkMessage {
    /// Create a message with an empty protocol and sender
    pub fn new(transaction_type: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            transaction_type: transaction_type.into(),
            protocol: String::new(),
            from: String::new(),
            payload,
        }
    }
}

/// Capability object for one transaction type
pub trait TransactionHandler: Send + Sync {
    /// Type name this handler is registered under
    fn type_name(&self) -> &str;

    /// Decode and validate a transaction delivered by the network
    fn receive_transaction(&self, message: &NetworkMessage) -> Result<SharedTransaction>;

    /// Apply a confirmed transaction; `false` means execution failed
    fn execute(&self, txn: &dyn Transaction) -> bool;

    /// Rebuild a transaction from its marshalled bytes
    fn unmarshal(&self, data: &[u8]) -> Result<SharedTransaction>;
}
