//! Block domain entities
//!
//! Blocks are built in two phases. A [`BlockDraft`] is mutable while the
//! generator assembles its payload; [`BlockDraft::seal`] computes the score
//! and the content-addressed id exactly once and yields an immutable
//! [`Block`].
//!
//! ## Content Addressing
//!
//! ```text
//! id = hex(SHA256(bincode(BlockMessage) ++ links[0].hash ++ links[1].hash ++ ...))
//!
//! links = [ ("parent", parent_id), ("txn-1", tx1), ("txn-2", tx2), ... ]
//! ```

use super::scoring::{compute_score, sha256};
use super::transaction::{SharedTransaction, TxHash};
use crate::config::BlockTypeConfig;
use crate::error::{LuckyBlockError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

/// Hex-encoded content-addressed block id
pub type BlockHash = String;

/// Link name pointing at the parent block
pub const PARENT_LINK: &str = "parent";

/// Prefix of the links pointing at contained transactions
pub const TXN_LINK_PREFIX: &str = "txn-";

/// Current wall clock in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Named reference from a block to another content-addressed object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub name: String,
    pub hash: String,
}

impl Link {
    pub fn new(name: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hash: hash.into(),
        }
    }
}

/// Ordered link set travelling beside a block's marshalled bytes
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links(Vec<Link>);

impl Links {
    /// Canonical link set: parent first, then one link per transaction.
    pub fn for_block(parent_id: &str, transaction_hashes: &[TxHash]) -> Self {
        let mut links = Vec::with_capacity(transaction_hashes.len() + 1);
        links.push(Link::new(PARENT_LINK, parent_id));
        links.extend(
            transaction_hashes
                .iter()
                .enumerate()
                .map(|(i, hash)| Link::new(format!("{TXN_LINK_PREFIX}{}", i + 1), hash.clone())),
        );
        Self(links)
    }

    pub fn from_vec(links: Vec<Link>) -> Self {
        Self(links)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of the parent link, if present
    pub fn parent(&self) -> Option<&str> {
        self.0
            .iter()
            .find(|l| l.name == PARENT_LINK)
            .map(|l| l.hash.as_str())
    }

    /// Split a link set received from the wire into parent id and
    /// transaction hashes ordered by their `txn-N` index.
    ///
    /// Links may arrive in any order; indices must be exactly `1..=n`.
    pub fn decode(&self) -> Result<(BlockHash, Vec<TxHash>)> {
        let mut parent = None;
        let mut indexed = Vec::with_capacity(self.0.len());

        for link in &self.0 {
            if link.name == PARENT_LINK {
                if parent.replace(link.hash.clone()).is_some() {
                    return Err(LuckyBlockError::ValidationFailure(
                        "duplicate parent link".to_string(),
                    ));
                }
                continue;
            }

            let index = link
                .name
                .strip_prefix(TXN_LINK_PREFIX)
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| {
                    LuckyBlockError::ValidationFailure(format!("unexpected link {}", link.name))
                })?;
            indexed.push((index, link.hash.clone()));
        }

        let parent = parent.ok_or_else(|| {
            LuckyBlockError::ValidationFailure("missing parent link".to_string())
        })?;

        indexed.sort_by_key(|(index, _)| *index);
        for (expected, (index, _)) in indexed.iter().enumerate() {
            if *index != expected + 1 {
                return Err(LuckyBlockError::ValidationFailure(format!(
                    "transaction links are not contiguous at txn-{}",
                    expected + 1
                )));
            }
        }

        Ok((parent, indexed.into_iter().map(|(_, hash)| hash).collect()))
    }
}

/// Serialized field payload of a block (links travel separately)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMessage {
    pub name: String,
    pub namespace: String,
    pub version: String,
    pub block_number: u64,
    pub timestamp: i64,
    pub peer_id: String,
    pub score: u32,
}

/// Identity, lineage and provenance fields of a block
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    pub name: String,
    pub namespace: String,
    pub version: String,
    /// Empty for genesis
    pub parent_id: BlockHash,
    pub block_number: u64,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub peer_id: String,
}

impl BlockHeader {
    fn new(block_type: &BlockTypeConfig, parent: Option<&Block>, peer_id: &str) -> Self {
        let (parent_id, block_number) = match parent {
            Some(parent) => (parent.hash().to_string(), parent.block_number() + 1),
            None => (String::new(), 0),
        };

        Self {
            name: block_type.name.clone(),
            namespace: block_type.namespace.clone(),
            version: block_type.version.clone(),
            parent_id,
            block_number,
            timestamp: now_millis(),
            peer_id: peer_id.to_string(),
        }
    }

    fn message(&self, score: u32) -> BlockMessage {
        BlockMessage {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            version: self.version.clone(),
            block_number: self.block_number,
            timestamp: self.timestamp,
            peer_id: self.peer_id.clone(),
            score,
        }
    }
}

/// Mutable block under assembly
#[derive(Clone, Debug)]
pub struct BlockDraft {
    header: BlockHeader,
    transactions: Vec<SharedTransaction>,
}

impl BlockDraft {
    /// Start a block extending `parent`, or a parentless block when `None`.
    pub fn new(block_type: &BlockTypeConfig, parent: Option<&Block>, peer_id: &str) -> Self {
        Self {
            header: BlockHeader::new(block_type, parent, peer_id),
            transactions: Vec::new(),
        }
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn transactions(&self) -> &[SharedTransaction] {
        &self.transactions
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.header.timestamp = timestamp;
        self
    }

    pub fn set_timestamp(&mut self, timestamp: i64) {
        self.header.timestamp = timestamp;
    }

    pub fn push_transaction(&mut self, txn: SharedTransaction) {
        self.transactions.push(txn);
    }

    pub fn set_transactions(&mut self, transactions: Vec<SharedTransaction>) {
        self.transactions = transactions;
    }

    /// Score the draft; identical to the sealed block's score.
    pub fn score(&self) -> u32 {
        compute_score(&self.header.peer_id, &self.header.parent_id)
    }

    /// Compute score and id and freeze the block.
    pub fn seal(self) -> Result<Block> {
        let score = self.score();
        let transaction_hashes = self.transactions.iter().map(|t| t.hash()).collect();
        Block::assemble(self.header, score, self.transactions, transaction_hashes)
    }
}

/// Sealed, immutable block
#[derive(Clone, Debug)]
pub struct Block {
    id: BlockHash,
    header: BlockHeader,
    score: u32,
    transactions: Vec<SharedTransaction>,
    transaction_hashes: Vec<TxHash>,
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Block {}

impl Block {
    fn assemble(
        header: BlockHeader,
        score: u32,
        transactions: Vec<SharedTransaction>,
        transaction_hashes: Vec<TxHash>,
    ) -> Result<Self> {
        let data = bincode::serialize(&header.message(score))?;
        let links = Links::for_block(&header.parent_id, &transaction_hashes);
        let id = content_id(&data, &links);

        Ok(Self {
            id,
            header,
            score,
            transactions,
            transaction_hashes,
        })
    }

    /// Empty, parentless shell of the given block type.
    ///
    /// Decoding registries keep one per type and call
    /// [`unmarshal`](Self::unmarshal) on it.
    pub fn prototype(block_type: &BlockTypeConfig) -> Result<Self> {
        BlockDraft::new(block_type, None, "").with_timestamp(0).seal()
    }

    pub fn hash(&self) -> &str {
        &self.id
    }

    pub fn parent_hash(&self) -> &str {
        &self.header.parent_id
    }

    pub fn block_number(&self) -> u64 {
        self.header.block_number
    }

    pub fn timestamp(&self) -> i64 {
        self.header.timestamp
    }

    pub fn peer_id(&self) -> &str {
        &self.header.peer_id
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn namespace(&self) -> &str {
        &self.header.namespace
    }

    pub fn version(&self) -> &str {
        &self.header.version
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_genesis(&self) -> bool {
        self.header.parent_id.is_empty()
    }

    /// Transaction bodies held locally. Empty for blocks decoded from the
    /// wire; see [`transaction_hashes`](Self::transaction_hashes).
    pub fn transactions(&self) -> &[SharedTransaction] {
        &self.transactions
    }

    /// Hashes of every transaction in the payload, in order
    pub fn transaction_hashes(&self) -> &[TxHash] {
        &self.transaction_hashes
    }

    /// Whether every payload transaction has a local body
    pub fn has_bodies(&self) -> bool {
        self.transactions.len() == self.transaction_hashes.len()
    }

    pub fn links(&self) -> Links {
        Links::for_block(&self.header.parent_id, &self.transaction_hashes)
    }

    /// Serialized field payload and ordered link set.
    pub fn marshal(&self) -> Result<(Vec<u8>, Links)> {
        let data = bincode::serialize(&self.header.message(self.score))?;
        Ok((data, self.links()))
    }

    /// Decode a block of this prototype's type.
    ///
    /// The claimed score is kept as-is; call [`valid`](Self::valid) to check
    /// it against the proposer and parent.
    pub fn unmarshal(&self, data: &[u8], links: &Links) -> Result<Block> {
        let msg: BlockMessage = bincode::deserialize(data)?;

        if msg.name != self.header.name
            || msg.namespace != self.header.namespace
            || msg.version != self.header.version
        {
            return Err(LuckyBlockError::UnknownType(format!(
                "{}/{}@{}",
                msg.namespace, msg.name, msg.version
            )));
        }

        let (parent_id, transaction_hashes) = links.decode()?;

        let header = BlockHeader {
            name: msg.name,
            namespace: msg.namespace,
            version: msg.version,
            parent_id,
            block_number: msg.block_number,
            timestamp: msg.timestamp,
            peer_id: msg.peer_id,
        };

        Block::assemble(header, msg.score, Vec::new(), transaction_hashes)
    }

    /// Structural validity and score verification.
    pub fn valid(&self) -> bool {
        if self.header.peer_id.is_empty() {
            return false;
        }

        // genesis <=> empty parent <=> number 0
        if self.is_genesis() != (self.header.block_number == 0) {
            return false;
        }

        if self.score != compute_score(&self.header.peer_id, &self.header.parent_id) {
            return false;
        }

        let mut seen = HashSet::with_capacity(self.transaction_hashes.len());
        self.transaction_hashes.iter().all(|h| seen.insert(h))
    }
}

/// Content-addressed id over marshalled bytes and link hashes.
pub fn content_id(data: &[u8], links: &Links) -> BlockHash {
    let mut buf = Vec::with_capacity(data.len() + links.len() * 64);
    buf.extend_from_slice(data);
    for link in links.iter() {
        buf.extend_from_slice(link.hash.as_bytes());
    }
    hex::encode(sha256(&buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_txn, TestTransaction};
    use std::sync::Arc;

    fn block_type() -> BlockTypeConfig {
        BlockTypeConfig::default()
    }

    fn genesis(peer: &str) -> Block {
        BlockDraft::new(&block_type(), None, peer)
            .with_timestamp(1_000)
            .seal()
            .unwrap()
    }

    #[test]
    fn test_genesis_lineage() {
        let g = genesis("peer-a");
        assert!(g.is_genesis());
        assert_eq!(g.block_number(), 0);
        assert_eq!(g.parent_hash(), "");
        assert!(g.valid());
    }

    #[test]
    fn test_child_lineage() {
        let g = genesis("peer-a");
        let child = BlockDraft::new(&block_type(), Some(&g), "peer-b")
            .seal()
            .unwrap();

        assert_eq!(child.block_number(), 1);
        assert_eq!(child.parent_hash(), g.hash());
        assert!(!child.is_genesis());
        assert!(child.valid());
    }

    #[test]
    fn test_hash_is_stable_and_deterministic() {
        let a = genesis("peer-a");
        let b = genesis("peer-a");
        assert_eq!(a.hash(), a.hash());
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.hash().len(), 64);
    }

    #[test]
    fn test_any_field_change_changes_id() {
        let base = genesis("peer-a");

        let other_peer = genesis("peer-b");
        assert_ne!(base.hash(), other_peer.hash());

        let other_time = BlockDraft::new(&block_type(), None, "peer-a")
            .with_timestamp(1_001)
            .seal()
            .unwrap();
        assert_ne!(base.hash(), other_time.hash());

        let mut ns = block_type();
        ns.namespace = "other".into();
        let other_ns = BlockDraft::new(&ns, None, "peer-a")
            .with_timestamp(1_000)
            .seal()
            .unwrap();
        assert_ne!(base.hash(), other_ns.hash());

        let mut draft = BlockDraft::new(&block_type(), None, "peer-a").with_timestamp(1_000);
        draft.push_transaction(test_txn("exchange", "t1"));
        let with_txn = draft.seal().unwrap();
        assert_ne!(base.hash(), with_txn.hash());
    }

    #[test]
    fn test_transaction_order_changes_id() {
        let mut d1 = BlockDraft::new(&block_type(), None, "p").with_timestamp(5);
        d1.set_transactions(vec![test_txn("x", "t1"), test_txn("x", "t2")]);
        let mut d2 = BlockDraft::new(&block_type(), None, "p").with_timestamp(5);
        d2.set_transactions(vec![test_txn("x", "t2"), test_txn("x", "t1")]);

        assert_ne!(d1.seal().unwrap().hash(), d2.seal().unwrap().hash());
    }

    #[test]
    fn test_score_ignores_payload() {
        let g = genesis("peer-a");
        let empty = BlockDraft::new(&block_type(), Some(&g), "peer-b");
        let mut full = BlockDraft::new(&block_type(), Some(&g), "peer-b");
        full.push_transaction(test_txn("x", "t1"));

        assert_eq!(empty.score(), full.score());
        assert_eq!(
            empty.seal().unwrap().score(),
            compute_score("peer-b", g.hash())
        );
    }

    #[test]
    fn test_links_layout() {
        let mut draft = BlockDraft::new(&block_type(), None, "p");
        draft.push_transaction(test_txn("x", "aa"));
        draft.push_transaction(test_txn("x", "bb"));
        let block = draft.seal().unwrap();

        let names: Vec<_> = block.links().iter().map(|l| l.name.clone()).collect();
        assert_eq!(names, vec!["parent", "txn-1", "txn-2"]);
        assert_eq!(block.links().parent(), Some(""));
    }

    #[test]
    fn test_unmarshal_reproduces_id() {
        let g = genesis("peer-a");
        let mut draft = BlockDraft::new(&block_type(), Some(&g), "peer-b");
        draft.push_transaction(test_txn("x", "t1"));
        draft.push_transaction(test_txn("x", "t2"));
        let block = draft.seal().unwrap();

        let (data, links) = block.marshal().unwrap();
        let proto = Block::prototype(&block_type()).unwrap();
        let decoded = proto.unmarshal(&data, &links).unwrap();

        assert_eq!(decoded.hash(), block.hash());
        assert_eq!(decoded.parent_hash(), g.hash());
        assert_eq!(decoded.score(), block.score());
        assert_eq!(decoded.transaction_hashes(), block.transaction_hashes());
        assert!(!decoded.has_bodies());
        assert!(decoded.valid());
    }

    #[test]
    fn test_unmarshal_accepts_shuffled_links() {
        let mut draft = BlockDraft::new(&block_type(), None, "p");
        for i in 0..12 {
            draft.push_transaction(test_txn("x", &format!("t{i}")));
        }
        let block = draft.seal().unwrap();
        let (data, links) = block.marshal().unwrap();

        let mut shuffled: Vec<Link> = links.iter().cloned().collect();
        shuffled.reverse();
        let decoded = Block::prototype(&block_type())
            .unwrap()
            .unmarshal(&data, &Links::from_vec(shuffled))
            .unwrap();

        assert_eq!(decoded.hash(), block.hash());
    }

    #[test]
    fn test_unmarshal_rejects_foreign_type() {
        let block = genesis("p");
        let (data, links) = block.marshal().unwrap();

        let mut other = block_type();
        other.name = "powblock".into();
        let err = Block::prototype(&other)
            .unwrap()
            .unmarshal(&data, &links)
            .unwrap_err();
        assert!(matches!(err, LuckyBlockError::UnknownType(_)));
    }

    #[test]
    fn test_unmarshal_rejects_bad_links() {
        let block = genesis("p");
        let (data, _) = block.marshal().unwrap();
        let proto = Block::prototype(&block_type()).unwrap();

        let missing_parent = Links::from_vec(vec![Link::new("txn-1", "aa")]);
        assert!(proto.unmarshal(&data, &missing_parent).is_err());

        let gap = Links::from_vec(vec![Link::new("parent", ""), Link::new("txn-2", "aa")]);
        assert!(proto.unmarshal(&data, &gap).is_err());

        let unknown = Links::from_vec(vec![Link::new("parent", ""), Link::new("uncle", "aa")]);
        assert!(proto.unmarshal(&data, &unknown).is_err());
    }

    #[test]
    fn test_forged_score_is_invalid() {
        let g = genesis("peer-a");
        let (data, links) = g.marshal().unwrap();
        let mut msg: BlockMessage = bincode::deserialize(&data).unwrap();
        msg.score = msg.score.wrapping_add(1);
        let forged = bincode::serialize(&msg).unwrap();

        let decoded = Block::prototype(&block_type())
            .unwrap()
            .unmarshal(&forged, &links)
            .unwrap();
        assert!(!decoded.valid());
    }

    #[test]
    fn test_duplicate_payload_is_invalid() {
        let txn: Arc<TestTransaction> = Arc::new(TestTransaction::new("x", "dup"));
        let mut draft = BlockDraft::new(&block_type(), None, "p");
        draft.push_transaction(txn.clone());
        draft.push_transaction(txn);
        assert!(!draft.seal().unwrap().valid());
    }

    #[test]
    fn test_prototype_is_empty_shell() {
        let proto = Block::prototype(&block_type()).unwrap();
        assert!(proto.is_genesis());
        assert!(proto.transactions().is_empty());
        assert_eq!(proto.peer_id(), "");
        assert!(!proto.valid());
    }
}
