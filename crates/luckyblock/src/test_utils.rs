//! Test doubles shared by unit and integration tests

use crate::domain::{NetworkMessage, SharedTransaction, Transaction, TransactionHandler, TxHash};
use crate::error::{LuckyBlockError, Result};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Transaction whose hash is chosen by the test
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestTransaction {
    pub tx_type: String,
    pub hash: TxHash,
}

impl TestTransaction {
    pub fn new(tx_type: &str, hash: &str) -> Self {
        Self {
            tx_type: tx_type.to_string(),
            hash: hash.to_string(),
        }
    }
}

impl Transaction for TestTransaction {
    fn hash(&self) -> TxHash {
        self.hash.clone()
    }

    fn type_name(&self) -> &str {
        &self.tx_type
    }

    fn marshal(&self) -> Result<Vec<u8>> {
        Ok(self.hash.as_bytes().to_vec())
    }
}

pub fn test_txn(tx_type: &str, hash: &str) -> SharedTransaction {
    Arc::new(TestTransaction::new(tx_type, hash))
}

/// Network message whose payload is the transaction hash
pub fn test_message(tx_type: &str, hash: &str) -> NetworkMessage {
    NetworkMessage::new(tx_type, hash.as_bytes().to_vec())
}

/// Handler that decodes the payload as the transaction hash and records
/// every execution. Hashes listed via [`fail_on`](Self::fail_on) fail.
#[derive(Debug, Default)]
pub struct TestHandler {
    type_name: String,
    failing: Mutex<HashSet<TxHash>>,
    executed: Mutex<Vec<TxHash>>,
}

impl TestHandler {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            ..Self::default()
        }
    }

    pub fn fail_on(&self, hash: &str) {
        self.failing.lock().insert(hash.to_string());
    }

    pub fn executed(&self) -> Vec<TxHash> {
        self.executed.lock().clone()
    }

    fn decode(&self, data: &[u8]) -> Result<SharedTransaction> {
        let hash = std::str::from_utf8(data)
            .map_err(|e| LuckyBlockError::ValidationFailure(e.to_string()))?;
        if hash.is_empty() {
            return Err(LuckyBlockError::ValidationFailure(
                "empty transaction payload".to_string(),
            ));
        }
        Ok(test_txn(&self.type_name, hash))
    }
}

impl TransactionHandler for TestHandler {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn receive_transaction(&self, message: &NetworkMessage) -> Result<SharedTransaction> {
        self.decode(&message.payload)
    }

    fn execute(&self, txn: &dyn Transaction) -> bool {
        let hash = txn.hash();
        if self.failing.lock().contains(&hash) {
            return false;
        }
        self.executed.lock().push(hash);
        true
    }

    fn unmarshal(&self, data: &[u8]) -> Result<SharedTransaction> {
        self.decode(data)
    }
}
