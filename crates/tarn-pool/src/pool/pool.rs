//! Connection pool implementation

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crossbeam_queue::ArrayQueue;
use parking_lot::RwLock;
use tarn_core::{BoxError, ConnectionFactory, Result, TarnError, Transport};

use super::config::PoolConfig;
use super::connection::{PooledConnection, PooledConnectionInner};
use super::stats::PoolStats;

/// Idle buffer and factory, present while the pool is open
struct Shared<T: Transport> {
    idle: ArrayQueue<PooledConnectionInner<T>>,
    factory: Box<dyn ConnectionFactory<T>>,
}

impl<T: Transport> Shared<T> {
    /// Pop and close every buffered connection, returning how many were closed
    fn drain(&self) -> usize {
        let mut closed = 0;
        while let Some(conn) = self.idle.pop() {
            conn.discard();
            closed += 1;
        }
        closed
    }
}

/// State shared by every `Pool` handle and weakly referenced by every
/// connection handed out
pub(super) struct PoolInner<T: Transport> {
    config: PoolConfig,
    /// `None` once the pool is closed. The lock guards the reference only;
    /// the queue does its own synchronisation.
    shared: RwLock<Option<Arc<Shared<T>>>>,
    idle_timeout: Option<Duration>,
    /// Next connection id, which is also the number of connections created
    next_id: AtomicU64,
    in_use: AtomicUsize,
    expired: AtomicU64,
    overflowed: AtomicU64,
}

impl<T: Transport> PoolInner<T> {
    fn new(config: PoolConfig, factory: Box<dyn ConnectionFactory<T>>) -> Self {
        let shared = Shared {
            idle: ArrayQueue::new(config.capacity()),
            factory,
        };
        Self {
            idle_timeout: config.idle_timeout(),
            config,
            shared: RwLock::new(Some(Arc::new(shared))),
            next_id: AtomicU64::new(0),
            in_use: AtomicUsize::new(0),
            expired: AtomicU64::new(0),
            overflowed: AtomicU64::new(0),
        }
    }

    fn snapshot(&self) -> Option<Arc<Shared<T>>> {
        self.shared.read().clone()
    }

    fn create(&self, shared: &Shared<T>) -> Result<PooledConnectionInner<T>> {
        let transport = shared.factory.create().map_err(TarnError::Factory)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(connection_id = id, "created connection");
        Ok(PooledConnectionInner::new(transport, id))
    }

    /// Take back a connection whose wrapper was closed
    ///
    /// The connection is buffered for reuse when there is room. A closed or
    /// full pool tears it down instead. Teardown failures are logged, never
    /// returned.
    pub(super) fn release(&self, conn: Option<PooledConnectionInner<T>>) -> Result<()> {
        let conn = conn.ok_or(TarnError::NilConnection)?;

        let rejected = {
            let shared = self.shared.read();
            match shared.as_ref() {
                None => Some((conn, "pool closed")),
                Some(shared) => shared.idle.push(conn).err().map(|conn| {
                    self.overflowed.fetch_add(1, Ordering::Relaxed);
                    (conn, "pool full")
                }),
            }
        };

        if let Some((conn, reason)) = rejected {
            tracing::debug!(
                connection_id = conn.id(),
                reason,
                "discarding returned connection"
            );
            conn.discard();
        }
        Ok(())
    }

    pub(super) fn checked_in(&self) {
        self.in_use.fetch_sub(1, Ordering::Relaxed);
    }
}

impl<T: Transport> Drop for PoolInner<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.get_mut().take() {
            shared.drain();
        }
    }
}

/// A pool of reusable transport connections
///
/// At most `capacity` idle connections are kept. Handing out connections is
/// never limited: when the pool is empty the factory is called, and when a
/// connection comes back to a full pool it is closed. Connections close
/// back into the pool, see [`PooledConnection::close`].
///
/// `Pool` is a cheap handle; clones share the same connections.
pub struct Pool<T: Transport> {
    pub(super) inner: Arc<PoolInner<T>>,
}

impl<T: Transport> Pool<T> {
    /// Create a pool from a configuration and a factory closure
    ///
    /// `initial_size` connections are created before this returns. If any of
    /// them fails, those already created are closed and the factory error is
    /// returned.
    pub fn new<F>(config: PoolConfig, factory: F) -> Result<Self>
    where
        F: Fn() -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        Self::builder(config).factory(factory).build()
    }

    /// Start building a pool
    pub fn builder(config: PoolConfig) -> PoolBuilder<T> {
        PoolBuilder {
            config,
            factory: None,
        }
    }

    /// Get a connection from the pool
    ///
    /// This will:
    /// 1. Pop an idle connection, closing and skipping any that sat idle
    ///    longer than the idle timeout
    /// 2. If none is left, create a new connection with the factory
    ///
    /// Never waits for another caller to return a connection. Factory errors
    /// are returned as they are, without retry.
    pub fn acquire(&self) -> Result<PooledConnection<T>> {
        let shared = self.inner.snapshot().ok_or(TarnError::PoolClosed)?;

        let conn = loop {
            match shared.idle.pop() {
                Some(mut conn) => {
                    if conn.is_expired(self.inner.idle_timeout, Instant::now()) {
                        self.inner.expired.fetch_add(1, Ordering::Relaxed);
                        tracing::debug!(connection_id = conn.id(), "evicting idle connection");
                        conn.discard();
                        continue;
                    }
                    conn.touch();
                    break conn;
                }
                None => break self.inner.create(&shared)?,
            }
        };

        self.inner.in_use.fetch_add(1, Ordering::Relaxed);
        Ok(PooledConnection::new(conn, Arc::downgrade(&self.inner)))
    }

    /// Close the pool and every idle connection in it
    ///
    /// Connections handed out earlier stay open; closing them later tears
    /// them down instead of returning them. Calling this more than once is a
    /// no-op.
    pub fn close(&self) {
        // Swap under the write lock, drain after releasing it.
        let shared = self.inner.shared.write().take();
        let Some(shared) = shared else {
            return;
        };
        let closed = shared.drain();
        tracing::debug!(closed, "pool closed");
    }

    /// Number of idle connections
    ///
    /// A snapshot; concurrent callers may change it immediately.
    pub fn size(&self) -> usize {
        self.inner.snapshot().map_or(0, |shared| shared.idle.len())
    }

    /// Whether [`Pool::close`] has been called
    pub fn is_closed(&self) -> bool {
        self.inner.shared.read().is_none()
    }

    /// Get current pool statistics
    pub fn stats(&self) -> PoolStats {
        PoolStats::new(
            self.size(),
            self.inner.config.capacity(),
            self.inner.in_use.load(Ordering::Relaxed),
            self.inner.next_id.load(Ordering::Relaxed),
            self.inner.expired.load(Ordering::Relaxed),
            self.inner.overflowed.load(Ordering::Relaxed),
        )
    }

    /// Get the pool configuration
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    fn fill(&self) -> Result<()> {
        let Some(shared) = self.inner.snapshot() else {
            return Ok(());
        };
        for _ in 0..self.inner.config.initial_size() {
            let conn = match self.inner.create(&shared) {
                Ok(conn) => conn,
                Err(err) => {
                    tracing::warn!(error = %err, "factory is not able to fill the pool");
                    self.close();
                    return Err(err);
                }
            };
            if let Err(conn) = shared.idle.push(conn) {
                conn.discard();
            }
        }
        Ok(())
    }
}

impl<T: Transport> Clone for Pool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("config", &self.inner.config)
            .field("closed", &self.is_closed())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Builder for [`Pool`]
///
/// A factory is required; `build` fails with a configuration error without
/// one.
pub struct PoolBuilder<T: Transport> {
    config: PoolConfig,
    factory: Option<Box<dyn ConnectionFactory<T>>>,
}

impl<T: Transport> PoolBuilder<T> {
    /// Use a closure as the connection factory
    pub fn factory<F>(self, factory: F) -> Self
    where
        F: Fn() -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        self.connection_factory(factory)
    }

    /// Use any [`ConnectionFactory`] implementation
    pub fn connection_factory<F: ConnectionFactory<T>>(mut self, factory: F) -> Self {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Validate the configuration and create the initial connections
    pub fn build(self) -> Result<Pool<T>> {
        self.config.validate()?;
        let factory = self.factory.ok_or_else(|| {
            TarnError::Configuration("a connection factory is required".into())
        })?;

        tracing::debug!(
            initial_size = self.config.initial_size(),
            capacity = self.config.capacity(),
            idle_timeout = ?self.config.idle_timeout(),
            "building connection pool"
        );

        let pool = Pool {
            inner: Arc::new(PoolInner::new(self.config, factory)),
        };
        pool.fill()?;
        Ok(pool)
    }
}
