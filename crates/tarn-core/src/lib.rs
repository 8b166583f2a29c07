//! Tarn Core - Transport and factory abstractions for the connection pool
//!
//! This crate provides the capabilities the pool needs from its environment:
//!
//! - `Transport` - a byte-stream connection that can be closed and introspected
//! - `ConnectionFactory` - something that produces a fresh `Transport`
//! - `TcpFactory` - a factory dialing a fixed TCP address
//! - `TarnError` - the error type shared by every tarn crate

mod error;
mod factory;
mod transport;

pub use error::{BoxError, Result, TarnError};
pub use factory::{ConnectionFactory, TcpFactory};
pub use transport::Transport;
