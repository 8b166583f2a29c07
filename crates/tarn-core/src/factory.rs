//! Connection factories
//!
//! A factory is whatever the pool calls when it has no idle connection to
//! hand out. Plain closures work, and `TcpFactory` covers the common case of
//! dialing a single TCP endpoint.

use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use crate::{BoxError, Transport};


/// Factory trait for creating new connections
///
/// Implemented for every `Fn() -> Result<T, BoxError>` closure, so most
/// callers never implement it by hand.
pub trait ConnectionFactory<T: Transport>: Send + Sync + 'static {
    /// Create a new connection
    fn create(&self) -> Result<T, BoxError>;
}

impl<T, F> ConnectionFactory<T> for F
where
    T: Transport,
    F: Fn() -> Result<T, BoxError> + Send + Sync + 'static,
{
    fn create(&self) -> Result<T, BoxError> {
        self()
    }
}

/// Factory that dials a fixed TCP address
#[derive(Debug, Clone)]
pub struct TcpFactory {
    addr: SocketAddr,
    connect_timeout: Option<Duration>,
    nodelay: bool,
}

impl TcpFactory {
    /// Create a factory for the given address
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            connect_timeout: None,
            nodelay: false,
        }
    }

    /// Bound how long a single dial may take
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set `TCP_NODELAY` on every new stream
    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Get the address this factory dials
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the connect timeout if set
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }
}

impl ConnectionFactory<TcpStream> for TcpFactory {
    fn create(&self) -> Result<TcpStream, BoxError> {
        let stream = match self.connect_timeout {
            Some(timeout) => TcpStream::connect_timeout(&self.addr, timeout)?,
            None => TcpStream::connect(self.addr)?,
        };
        if self.nodelay {
            stream.set_nodelay(true)?;
        }
        tracing::trace!(addr = %self.addr, "dialed tcp connection");
        Ok(stream)
    }
}
