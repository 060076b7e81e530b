//! `rustls` adapter for the pluggable transport boundary (spec §6),
//! feature-gated behind `rustls`.
//!
//! Grounded on the teacher's `client/src/rustls_transport.rs`: same
//! webpki-roots-backed default trust store and the same `host`-as-server-name
//! handshake, adapted from its `async_tls`-driven connect to a synchronous
//! handshake over a blocking `TcpStream`, switched to non-blocking only once
//! the handshake has completed.

use std::io::{self, Write};
use std::net::TcpStream;
use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};

use crate::transport::{SecureConnector, Transport};

fn to_io_error<E: std::error::Error + Send + Sync + 'static>(e: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

/// A [`SecureConnector`] backed by `rustls`, trusting the `webpki-roots`
/// bundled CA set (the teacher's own fallback when native root-store loading
/// is unavailable).
pub struct RustlsConnector {
    config: Arc<ClientConfig>,
}

impl RustlsConnector {
    /// Build a connector trusting the `webpki-roots` CA bundle.
    pub fn new() -> Self {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let config = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        Self {
            config: Arc::new(config),
        }
    }
}

impl Default for RustlsConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureConnector for RustlsConnector {
    fn connect(&self, host: &str, port: u16) -> io::Result<Box<dyn Transport>> {
        let server_name = ServerName::try_from(host.to_owned()).map_err(to_io_error)?;
        let mut conn =
            ClientConnection::new(Arc::clone(&self.config), server_name).map_err(to_io_error)?;
        let mut tcp = TcpStream::connect((host, port))?;

        {
            let mut handshake = rustls::Stream::new(&mut conn, &mut tcp);
            while handshake.conn.is_handshaking() {
                handshake.complete_io()?;
            }
            handshake.flush()?;
        }

        tcp.set_nonblocking(true)?;
        Ok(Box::new(StreamOwned::new(conn, tcp)))
    }
}

impl Transport for StreamOwned<ClientConnection, TcpStream> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(self, buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(self, buf)
    }
}
