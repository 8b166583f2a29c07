//! Tarn Pool End-to-End Testing Suite
//!
//! Exercises the pool against real TCP connections to an in-process echo
//! server. Every test starts its own server on an ephemeral port, so tests
//! can run in parallel without sharing state.
//!
//! # Test Categories
//!
//! - Pool lifecycle (construction, acquire/return, idle eviction, close)
//! - Concurrent access (many threads sharing one pool)
//!
//! # Usage
//!
//! ```bash
//! cargo test -p tarn-pool-tests
//!
//! # With pool logging
//! RUST_LOG=tarn_pool=debug cargo test -p tarn-pool-tests -- --nocapture
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod fixtures;

#[cfg(test)]
pub mod pool_tests;

#[cfg(test)]
pub mod concurrency_tests;
