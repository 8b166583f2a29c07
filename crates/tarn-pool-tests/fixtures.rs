//! Shared fixtures for the end-to-end pool tests.
//!
//! Provides an in-process TCP echo server that counts the connections it
//! accepts and the ones its clients hang up, a factory that counts how often
//! the pool dials, and a one-time tracing subscriber.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tarn_pool_tests::fixtures::{init_tracing, tcp_pool};
//! use tarn_pool::PoolConfig;
//!
//! init_tracing();
//! let (pool, server, factory) = tcp_pool(PoolConfig::new(2, 5))?;
//! let conn = pool.acquire()?;
//! ```

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use tarn_core::{BoxError, ConnectionFactory, TcpFactory};
use tarn_pool::{Pool, PoolConfig};
use tracing_subscriber::EnvFilter;

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
});

/// Install the test subscriber once per process.
///
/// Filter with `RUST_LOG`, defaulting to `warn`.
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// Counters kept by the echo server.
#[derive(Debug, Default)]
pub struct ServerStats {
    accepted: AtomicUsize,
    disconnected: AtomicUsize,
}

impl ServerStats {
    /// Connections accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Connections whose client has hung up.
    pub fn disconnected(&self) -> usize {
        self.disconnected.load(Ordering::SeqCst)
    }
}

/// TCP echo server running on a background thread.
///
/// The listener thread lives until the test process exits.
#[derive(Debug, Clone)]
pub struct EchoServer {
    addr: SocketAddr,
    stats: Arc<ServerStats>,
}

impl EchoServer {
    /// Bind an ephemeral localhost port and start accepting.
    pub fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").context("bind echo server")?;
        let addr = listener.local_addr()?;
        let stats = Arc::new(ServerStats::default());

        let accept_stats = Arc::clone(&stats);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                accept_stats.accepted.fetch_add(1, Ordering::SeqCst);
                let conn_stats = Arc::clone(&accept_stats);
                thread::spawn(move || echo(stream, &conn_stats));
            }
        });

        Ok(Self { addr, stats })
    }

    /// Address the server listens on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Connection counters.
    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }
}

fn echo(mut stream: TcpStream, stats: &ServerStats) {
    let mut buf = [0u8; 1024];
    loop {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if stream.write_all(&buf[..n]).is_err() {
                    break;
                }
            }
        }
    }
    stats.disconnected.fetch_add(1, Ordering::SeqCst);
}

/// TCP factory that counts successful dials.
#[derive(Debug, Clone)]
pub struct CountingFactory {
    inner: TcpFactory,
    dials: Arc<AtomicUsize>,
}

impl CountingFactory {
    /// Dial `addr` with a short connect timeout.
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            inner: TcpFactory::new(addr)
                .with_connect_timeout(Duration::from_secs(2))
                .with_nodelay(true),
            dials: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of connections dialed so far.
    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }
}

impl ConnectionFactory<TcpStream> for CountingFactory {
    fn create(&self) -> std::result::Result<TcpStream, BoxError> {
        let stream = self.inner.create()?;
        self.dials.fetch_add(1, Ordering::SeqCst);
        Ok(stream)
    }
}

/// Start an echo server and build a pool of connections to it.
pub fn tcp_pool(config: PoolConfig) -> Result<(Pool<TcpStream>, EchoServer, CountingFactory)> {
    init_tracing();
    let server = EchoServer::start()?;
    let factory = CountingFactory::new(server.addr());
    let pool = Pool::<TcpStream>::builder(config)
        .connection_factory(factory.clone())
        .build()
        .context("build tcp pool")?;
    Ok((pool, server, factory))
}

/// Write `payload` and read the echo back.
pub fn round_trip(stream: &mut impl ReadWrite, payload: &[u8]) -> Result<Vec<u8>> {
    stream.write_all(payload)?;
    let mut buf = vec![0u8; payload.len()];
    stream.read_exact(&mut buf)?;
    Ok(buf)
}

/// Anything that can be both read and written.
pub trait ReadWrite: Read + Write {}

impl<T: Read + Write> ReadWrite for T {}

/// Poll `condition` until it holds or `timeout` passes.
///
/// Server-side counters are updated on other threads, so assertions on them
/// have to wait.
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
