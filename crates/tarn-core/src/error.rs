//! Error types for tarn

use thiserror::Error;

/// Boxed error produced by a connection factory
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core error type for tarn operations
#[derive(Error, Debug)]
pub enum TarnError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Factory error: {0}")]
    Factory(#[source] BoxError),

    #[error("Pool is closed")]
    PoolClosed,

    #[error("Connection is nil, rejecting")]
    NilConnection,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TarnError {
    /// Wrap a factory failure
    pub fn factory(err: impl Into<BoxError>) -> Self {
        Self::Factory(err.into())
    }

    /// Returns true if this error means the pool has been shut down
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::PoolClosed)
    }
}

/// Result type alias for tarn operations
pub type Result<T> = std::result::Result<T, TarnError>;
