//! Pooled connection wrapper
//!
//! A `PooledConnection` behaves like the transport it wraps, except that
//! closing it gives the transport back to the pool. Marking it unusable
//! turns `close` back into a real teardown.

use std::fmt;
use std::io::{self, IoSlice, Read, Write};
use std::net::SocketAddr;
use std::sync::Weak;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tarn_core::Transport;

use super::pool::PoolInner;

/// Internal wrapper for pooled transports with metadata
///
/// This is what the idle buffer holds.
pub(super) struct PooledConnectionInner<T: Transport> {
    transport: T,
    id: u64,
    last_used_at: Instant,
}

impl<T: Transport> PooledConnectionInner<T> {
    pub(super) fn new(transport: T, id: u64) -> Self {
        Self {
            transport,
            id,
            last_used_at: Instant::now(),
        }
    }

    pub(super) fn id(&self) -> u64 {
        self.id
    }

    pub(super) fn touch(&mut self) {
        self.last_used_at = Instant::now();
    }

    /// Whether the connection has been idle past `idle_timeout` at `now`
    pub(super) fn is_expired(&self, idle_timeout: Option<Duration>, now: Instant) -> bool {
        idle_timeout
            .and_then(|timeout| self.last_used_at.checked_add(timeout))
            .is_some_and(|deadline| now > deadline)
    }

    fn close(mut self) -> io::Result<()> {
        self.transport.close()
    }

    /// Close the transport, logging rather than returning a failure
    pub(super) fn discard(self) {
        let id = self.id;
        if let Err(err) = self.close() {
            tracing::warn!(connection_id = id, error = %err, "failed to close connection");
        }
    }
}

/// A connection borrowed from the pool
///
/// Reads, writes and address lookups go straight to the underlying
/// transport. [`close`](PooledConnection::close), or dropping the wrapper,
/// returns the transport to the pool unless the connection was marked
/// unusable, in which case the transport is closed.
pub struct PooledConnection<T: Transport> {
    /// `None` once the connection has been closed or returned
    inner: Option<PooledConnectionInner<T>>,
    pool: Weak<PoolInner<T>>,
    usable: AtomicBool,
    id: u64,
    last_used_at: Instant,
}

impl<T: Transport> PooledConnection<T> {
    pub(super) fn new(inner: PooledConnectionInner<T>, pool: Weak<PoolInner<T>>) -> Self {
        Self {
            id: inner.id,
            last_used_at: inner.last_used_at,
            inner: Some(inner),
            pool,
            usable: AtomicBool::new(true),
        }
    }

    /// Identifier assigned when the pool created this connection
    ///
    /// Stays the same across every reuse of the same transport.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// When this connection was last handed out
    pub fn last_used_at(&self) -> Instant {
        self.last_used_at
    }

    /// Whether closing this connection will return it to the pool
    pub fn is_usable(&self) -> bool {
        self.usable.load(Ordering::Acquire)
    }

    /// Never return this connection to the pool
    ///
    /// Use after an I/O error so a broken transport is not reused. Cannot be
    /// undone.
    pub fn mark_unusable(&self) {
        self.usable.store(false, Ordering::Release);
    }

    /// Whether the connection has already been closed or returned
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Get the underlying transport, `None` after close
    pub fn get_ref(&self) -> Option<&T> {
        self.inner.as_ref().map(|inner| &inner.transport)
    }

    /// Get the underlying transport mutably, `None` after close
    ///
    /// Closing the transport through this reference bypasses the pool; call
    /// [`mark_unusable`](PooledConnection::mark_unusable) first if you do.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.inner.as_mut().map(|inner| &mut inner.transport)
    }

    /// Return the connection to the pool
    ///
    /// If the connection was marked unusable the transport is closed and its
    /// result returned. Otherwise the pool takes it back, closing it when the
    /// pool is full or closed; failures on that path are logged, not
    /// returned.
    pub fn close(&mut self) -> io::Result<()> {
        let pool = self.pool.upgrade();
        let inner = self.inner.take();
        if let (Some(pool), Some(_)) = (&pool, &inner) {
            pool.checked_in();
        }

        if !self.is_usable() {
            return inner.map_or(Ok(()), PooledConnectionInner::close);
        }

        match pool {
            Some(pool) => {
                if let Err(err) = pool.release(inner) {
                    tracing::warn!(connection_id = self.id, error = %err, "rejected release");
                }
            }
            None => {
                if let Some(inner) = inner {
                    tracing::debug!(connection_id = self.id, "pool is gone, closing connection");
                    inner.discard();
                }
            }
        }
        Ok(())
    }

    fn transport(&self) -> io::Result<&T> {
        self.get_ref().ok_or_else(not_connected)
    }

    fn transport_mut(&mut self) -> io::Result<&mut T> {
        self.get_mut().ok_or_else(not_connected)
    }
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "connection already closed")
}

impl<T: Transport> Read for PooledConnection<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.transport_mut()?.read(buf)
    }
}

impl<T: Transport> Write for PooledConnection<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.transport_mut()?.write(buf)
    }

    fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
        self.transport_mut()?.write_vectored(bufs)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.transport_mut()?.flush()
    }
}

impl<T: Transport> Transport for PooledConnection<T> {
    fn close(&mut self) -> io::Result<()> {
        PooledConnection::close(self)
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.transport()?.peer_addr()
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.transport()?.local_addr()
    }
}

impl<T: Transport> Drop for PooledConnection<T> {
    fn drop(&mut self) {
        if self.inner.is_some()
            && let Err(err) = self.close()
        {
            tracing::warn!(
                connection_id = self.id,
                error = %err,
                "failed to close dropped connection"
            );
        }
    }
}

impl<T: Transport> fmt::Debug for PooledConnection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("id", &self.id)
            .field("usable", &self.is_usable())
            .field("closed", &self.is_closed())
            .finish()
    }
}
