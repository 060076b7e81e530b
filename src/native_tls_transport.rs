//! `native-tls` adapter for the pluggable transport boundary (spec §6),
//! feature-gated behind `native-tls`.
//!
//! Grounded on the teacher's `client/src/native_tls_transport.rs`, which
//! wraps a transport in an enum dispatching on whether TLS is active; this
//! version drops the plain-TCP arm of that enum (the core already calls
//! [`SecureConnector`] only for the `https` case, via `connect_plain` for
//! plain requests) and performs the handshake synchronously over a blocking
//! `TcpStream` rather than the teacher's `async_native_tls::connect`.

use std::io;
use std::net::TcpStream;

use native_tls::TlsConnector as NativeTlsConnectorImpl;

use crate::transport::{SecureConnector, Transport};

/// A [`SecureConnector`] backed by the platform's native TLS library
/// (Schannel, Secure Transport, or OpenSSL, depending on target) via
/// `native-tls`.
pub struct NativeTlsConnector {
    connector: NativeTlsConnectorImpl,
}

impl NativeTlsConnector {
    /// Build a connector using the platform's default trust store.
    pub fn new() -> io::Result<Self> {
        let connector =
            NativeTlsConnectorImpl::new().map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(Self { connector })
    }
}

impl SecureConnector for NativeTlsConnector {
    fn connect(&self, host: &str, port: u16) -> io::Result<Box<dyn Transport>> {
        let stream = TcpStream::connect((host, port))?;
        let tls = self
            .connector
            .connect(host, stream)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        tls.get_ref().set_nonblocking(true)?;
        Ok(Box::new(tls))
    }
}

impl Transport for native_tls::TlsStream<TcpStream> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(self, buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(self, buf)
    }
}
