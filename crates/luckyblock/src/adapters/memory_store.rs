//! In-memory block store adapter
//!
//! Implements the [`BlockStore`] port with staged writes and an explicit
//! durable map. Used by tests and by hosts that keep the chain in memory.

use crate::domain::{Block, BlockHash};
use crate::error::StoreError;
use crate::ports::{BlockStore, StoreTransaction};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct StoreInner {
    durable: RwLock<HashMap<BlockHash, Block>>,
    submit_delay: RwLock<Option<Duration>>,
    fail_open: AtomicBool,
    fail_commit: AtomicBool,
    opened: AtomicUsize,
    reverted: AtomicUsize,
    submitting: AtomicUsize,
    max_submitting: AtomicUsize,
}

/// Counts a submit as in flight until dropped
struct SubmitGuard<'a>(&'a StoreInner);

impl<'a> SubmitGuard<'a> {
    fn enter(inner: &'a StoreInner) -> Self {
        let depth = inner.submitting.fetch_add(1, Ordering::SeqCst) + 1;
        inner.max_submitting.fetch_max(depth, Ordering::SeqCst);
        Self(inner)
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.submitting.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory content-addressed block store.
///
/// Submitting a block that is already durable or staged is idempotent and
/// returns its hash, matching content-addressed semantics.
#[derive(Clone, Debug, Default)]
pub struct InMemoryBlockStore {
    inner: Arc<StoreInner>,
}

impl InMemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every submit, to exercise commit deadlines
    pub fn with_submit_delay(self, delay: Duration) -> Self {
        *self.inner.submit_delay.write() = Some(delay);
        self
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.inner.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_commit(&self, fail: bool) {
        self.inner.fail_commit.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.inner.durable.read().contains_key(hash)
    }

    pub fn get(&self, hash: &str) -> Option<Block> {
        self.inner.durable.read().get(hash).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.durable.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.durable.read().is_empty()
    }

    /// Sorted hashes of every durable block
    pub fn durable_hashes(&self) -> Vec<BlockHash> {
        let mut hashes: Vec<_> = self.inner.durable.read().keys().cloned().collect();
        hashes.sort();
        hashes
    }

    /// Number of transactions opened so far
    pub fn open_count(&self) -> usize {
        self.inner.opened.load(Ordering::SeqCst)
    }

    /// Number of revert calls so far
    pub fn revert_count(&self) -> usize {
        self.inner.reverted.load(Ordering::SeqCst)
    }

    /// Highest number of submits ever in flight at once
    pub fn max_concurrent_submits(&self) -> usize {
        self.inner.max_submitting.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlockStore for InMemoryBlockStore {
    async fn open_block(
        &self,
        block_number: u64,
    ) -> Result<Box<dyn StoreTransaction>, StoreError> {
        if self.inner.fail_open.load(Ordering::SeqCst) {
            return Err(StoreError::OpenFailed(block_number));
        }
        self.inner.opened.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MemoryStoreTransaction {
            inner: self.inner.clone(),
            block_number,
            staged: Vec::new(),
        }))
    }
}

/// Transaction over an [`InMemoryBlockStore`]
#[derive(Debug)]
pub struct MemoryStoreTransaction {
    inner: Arc<StoreInner>,
    block_number: u64,
    staged: Vec<Block>,
}

impl MemoryStoreTransaction {
    fn find(&self, hash: &str) -> Option<u64> {
        self.staged
            .iter()
            .find(|b| b.hash() == hash)
            .map(|b| b.block_number())
            .or_else(|| {
                self.inner
                    .durable
                    .read()
                    .get(hash)
                    .map(|b| b.block_number())
            })
    }
}

#[async_trait]
impl StoreTransaction for MemoryStoreTransaction {
    async fn submit(&mut self, block: &Block) -> Result<BlockHash, StoreError> {
        let _guard = SubmitGuard::enter(&self.inner);
        let delay = *self.inner.submit_delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.find(block.hash()).is_some() {
            return Ok(block.hash().to_string());
        }

        let expected = if block.is_genesis() {
            0
        } else {
            let parent_number =
                self.find(block.parent_hash())
                    .ok_or_else(|| StoreError::UnknownParent {
                        block: block.hash().to_string(),
                        parent: block.parent_hash().to_string(),
                    })?;
            parent_number + 1
        };

        if block.block_number() != expected {
            return Err(StoreError::InvalidNumber {
                expected,
                actual: block.block_number(),
            });
        }

        self.staged.push(block.clone());
        Ok(block.hash().to_string())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        if self.inner.fail_commit.load(Ordering::SeqCst) {
            return Err(StoreError::CommitFailed(format!(
                "injected failure at block {}",
                self.block_number
            )));
        }

        let mut durable = self.inner.durable.write();
        for block in self.staged.drain(..) {
            durable.insert(block.hash().to_string(), block);
        }
        Ok(())
    }

    async fn revert(&mut self) {
        self.inner.reverted.fetch_add(1, Ordering::SeqCst);
        self.staged.clear();
    }
}
