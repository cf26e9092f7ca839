//! # luckyblock
//!
//! Proof-of-luck style block consensus core.
//!
//! ## Purpose
//!
//! Every node proposes blocks carrying a score derived from its own identity
//! and the parent block id. Competing candidates at the same height are
//! ranked by a deterministic tournament, so all nodes seeing the same set of
//! candidates pick the same winner without any further communication.
//!
//! ## Block Lifecycle
//!
//! ```text
//! receive_transaction ──→ [pool] ──generate_block──→ BlockDraft ──seal──→ Block
//!                                                                           │
//!                       select_winner(candidates) ←─────────────────────────┘
//!                                  │
//!                   try_commit_block (dry run) ──→ confirm_block ──→ [store]
//!                                                        │
//!                                       commit_block: execute + unlog
//! ```
//!
//! | Stage | Method | Effect |
//! |-------|--------|--------|
//! | Receive | `receive_transaction()` | Decode via handler, log into pool |
//! | Assemble | `generate_block()` | Pool remainder on top of `branch[0]` |
//! | Rank | `select_winner()` | Tournament over candidate scores |
//! | Validate | `try_commit_block()` | Replay branch, submit, always revert |
//! | Confirm | `confirm_block()` | Durable commit, then execute and unlog |
//!
//! ## Scoring
//!
//! `score = Π popcount(sha256(peer ‖ parent ‖ hex(score)))` over four
//! rounds, each factor floored at 1 and the product clamped to 0 on
//! overflow. See [`domain::scoring`].
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! adapters/  - InMemoryBlockStore, InMemoryEventBus
//! ports/     - BlockGeneratorApi (inbound), BlockStore/EventPublisher (outbound)
//! service/   - BlockGenerator, BlockCommitter
//! domain/    - Block, scoring, comparator, TransactionPool, HandlerRegistry
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use luckyblock::{BlockGenerator, HandlerRegistry, LuckyBlockConfig};
//! use luckyblock::adapters::{InMemoryBlockStore, InMemoryEventBus};
//!
//! let generator = BlockGenerator::new(
//!     LuckyBlockConfig::from_env(),
//!     HandlerRegistry::new().with(exchange_handler),
//!     Arc::new(InMemoryBlockStore::new()),
//!     Arc::new(InMemoryEventBus::new()),
//! );
//!
//! let genesis = generator.generate_genesis_block()?;
//! generator.confirm_block(&genesis).await?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod ports;
pub mod service;
pub mod test_utils;

pub use config::{BlockTypeConfig, ConfigError, LuckyBlockConfig};
pub use domain::{
    compute_score, select_winner, Block, BlockDraft, BlockHash, BlockHeader, HandlerRegistry,
    Link, Links, NetworkMessage, Outcome, SharedTransaction, Transaction, TransactionHandler,
    TransactionPool, TxHash,
};
pub use error::{LuckyBlockError, Result, StoreError};
pub use events::LuckyBlockEvent;
pub use ports::{BlockGeneratorApi, BlockStore, EventPublisher, StoreTransaction};
pub use service::{BlockCommitter, BlockGenerator};
