//! # luckyblock Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks (scoring, fork choice, pool)
//! └── src/integration/  # Multi-node flows over a shared store
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p luckyblock-tests
//! cargo bench -p luckyblock-tests
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
