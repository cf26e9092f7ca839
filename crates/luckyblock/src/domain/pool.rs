//! # Outstanding Transaction Pool
//!
//! Registry of received, not-yet-confirmed transactions keyed by hash.
//!
//! ```text
//! [RECEIVED] ──log──→ [OUTSTANDING] ──block confirmed + executed──→ [REMOVED]
//! ```
//!
//! Receipt (insert), confirmation (delete) and block assembly (snapshot) all
//! hold the pool lock for their whole step, so assembly never observes a
//! partially updated pool.

use super::transaction::{SharedTransaction, TxHash};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// Concurrent-safe map of outstanding transactions.
///
/// INVARIANT: a transaction hash appears at most once.
#[derive(Debug, Default)]
pub struct TransactionPool {
    outstanding: Mutex<HashMap<TxHash, SharedTransaction>>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a received transaction. Returns `false` if the hash was already
    /// outstanding, in which case the pool is unchanged.
    pub fn log_transaction(&self, txn: SharedTransaction) -> bool {
        let hash = txn.hash();
        let mut outstanding = self.outstanding.lock();
        if outstanding.contains_key(&hash) {
            return false;
        }
        outstanding.insert(hash, txn);
        true
    }

    /// Remove confirmed transactions. Returns how many were present.
    pub fn unlog_transactions<'a, I>(&self, hashes: I) -> usize
    where
        I: IntoIterator<Item = &'a TxHash>,
    {
        let mut outstanding = self.outstanding.lock();
        hashes
            .into_iter()
            .filter(|h| outstanding.remove(*h).is_some())
            .count()
    }

    /// Outstanding transactions whose hash is not in `exclude`.
    ///
    /// Returned in hash order so that assembly is reproducible.
    pub fn remainder(&self, exclude: &HashSet<TxHash>) -> Vec<SharedTransaction> {
        let outstanding = self.outstanding.lock();
        let mut remainder: Vec<_> = outstanding
            .iter()
            .filter(|(hash, _)| !exclude.contains(*hash))
            .map(|(hash, txn)| (hash.clone(), txn.clone()))
            .collect();
        drop(outstanding);

        remainder.sort_by(|a, b| a.0.cmp(&b.0));
        remainder.into_iter().map(|(_, txn)| txn).collect()
    }

    /// Copy of every outstanding transaction
    pub fn snapshot(&self) -> Vec<SharedTransaction> {
        self.remainder(&HashSet::new())
    }

    pub fn get(&self, hash: &str) -> Option<SharedTransaction> {
        self.outstanding.lock().get(hash).cloned()
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.outstanding.lock().contains_key(hash)
    }

    pub fn hashes(&self) -> HashSet<TxHash> {
        self.outstanding.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.outstanding.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.outstanding.lock().is_empty()
    }
}
