//! Connection pooling for transport connections
//!
//! This module provides a pool that caps how many idle connections are kept
//! for reuse, evicts connections that sat idle past a timeout, and redirects
//! `close` on a handed-out connection back into the pool.
//!
//! The cap applies to idle connections only. An empty pool never makes a
//! caller wait; it asks the factory for a new connection instead, and a full
//! pool discards returned connections rather than blocking.
//!
//! # Example
//!
//! ```no_run
//! use std::net::TcpStream;
//! use tarn_pool::pool::{Pool, PoolConfig};
//!
//! # fn main() -> tarn_pool::Result<()> {
//! let config = PoolConfig::new(2, 5).with_idle_timeout_ms(5_000);
//! let pool = Pool::new(config, || Ok(TcpStream::connect("127.0.0.1:8098")?))?;
//!
//! let mut conn = pool.acquire()?;
//! // Use connection...
//! conn.close()?; // back into the pool
//! # Ok(())
//! # }
//! ```

mod config;
mod connection;
#[allow(clippy::module_inception)]
mod pool;
mod stats;


pub use config::PoolConfig;
pub use connection::PooledConnection;
pub use pool::{Pool, PoolBuilder};
pub use stats::PoolStats;
