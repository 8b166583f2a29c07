//! Transport trait and the standard library stream implementations

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};

/// A byte-stream connection the pool can hand out and reclaim
///
/// Reading and writing come from `Read` and `Write`. `close` tears the
/// connection down for real; the pool only calls it when a connection is
/// discarded, never when one is merely returned.
pub trait Transport: Read + Write + Send + 'static {
    /// Tear down the connection
    fn close(&mut self) -> io::Result<()>;

    /// Address of the remote end
    fn peer_addr(&self) -> io::Result<SocketAddr>;

    /// Address of the local end
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

impl Transport for TcpStream {
    fn close(&mut self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::peer_addr(self)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::local_addr(self)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        (**self).peer_addr()
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        (**self).local_addr()
    }
}
