//! Tarn Pool - Bounded reuse of expensive connections
//!
//! This crate keeps a bounded set of idle connections around so callers do
//! not pay the connect cost on every request. Closing a pooled connection
//! hands it back to the pool instead of tearing it down.

pub mod pool;

pub use pool::{Pool, PoolBuilder, PoolConfig, PoolStats, PooledConnection};
pub use tarn_core::{BoxError, ConnectionFactory, Result, TarnError, TcpFactory, Transport};
