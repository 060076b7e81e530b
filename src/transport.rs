//! Transport adapter (component A, spec §4.A) and blocking I/O helpers
//! (component B, spec §4.B).
//!
//! The C original exposes the adapter as four function pointers
//! (`open`/`close`/`read`/`write`) operating on an opaque handle. The
//! idiomatic translation used here, in the spirit of the teacher's
//! `ClientTransport` trait (`client/src/transport.rs`), is a trait object: the
//! "opaque handle" becomes a boxed [`Transport`], and `close` becomes `Drop`
//! on that box rather than an explicit call.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

/// A byte-stream transport: plain TCP, or a caller-supplied secure channel.
///
/// Selection between the two is purely by `is_https` (spec §4.A). `read`/
/// `write` follow Rust's ordinary non-blocking contract: `Ok(0)` on `read`
/// means the peer closed the connection (true EOF); `Err` with
/// `ErrorKind::WouldBlock` means no progress is available yet (the "0 means
/// would-block/idle" sentinel of the C original, sharpened so that idle and
/// EOF are no longer ambiguous); any other `Err` is fatal.
pub trait Transport: Send {
    /// Read available bytes into `buf`, returning the number read.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write as many of `buf`'s bytes as can be written without blocking.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
}

impl Transport for TcpStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(self, buf)
    }
}

/// Factory for a secure transport, supplied by the caller (spec §6
/// "Transport boundary (pluggable TLS)"). The core never initiates a TLS
/// handshake itself; it only calls through this contract.
pub trait SecureConnector: Send + Sync {
    /// Open a secure connection to `host:port`, performing the TLS handshake.
    fn connect(&self, host: &str, port: u16) -> io::Result<Box<dyn Transport>>;
}

/// Open a plain TCP transport to `host:port`, configured non-blocking so that
/// `read`/`write` observe the `WouldBlock` contract described on [`Transport`].
pub fn connect_plain(host: &str, port: u16) -> io::Result<Box<dyn Transport>> {
    let stream = TcpStream::connect((host, port))?;
    stream.set_nonblocking(true)?;
    Ok(Box::new(stream))
}

/// Repeatedly call `transport.write`, accumulating progress, until `n` bytes
/// have been written or `timeout_ms` of wall-clock time has elapsed with no
/// progress (component B, spec §4.B).
///
/// The "last progress" clock resets whenever a positive result arrives. A
/// fatal `Err` (anything but `WouldBlock`) terminates immediately. The
/// return value is the total bytes written, which may be less than `n` if
/// the idle timeout elapsed first.
pub fn write_block(
    transport: &mut dyn Transport,
    mut buf: &[u8],
    timeout_ms: u64,
) -> io::Result<usize> {
    let mut written = 0usize;
    let mut last_progress = Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    while !buf.is_empty() {
        match transport.write(buf) {
            Ok(0) => {
                if last_progress.elapsed() >= timeout {
                    break;
                }
            }
            Ok(n) => {
                written += n;
                buf = &buf[n..];
                last_progress = Instant::now();
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                if last_progress.elapsed() >= timeout {
                    break;
                }
            }
            Err(e) => return Err(e),
        }
    }

    Ok(written)
}

/// The read-side counterpart of [`write_block`]: loops until `buf` is full
/// or the idle timeout elapses, returning the total bytes read. A `Ok(0)`
/// read (true EOF) stops the loop immediately, same as a fatal error would.
pub fn read_block(
    transport: &mut dyn Transport,
    buf: &mut [u8],
    timeout_ms: u64,
) -> io::Result<usize> {
    let mut read = 0usize;
    let mut last_progress = Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    while read < buf.len() {
        match transport.read(&mut buf[read..]) {
            Ok(0) => break,
            Ok(n) => {
                read += n;
                last_progress = Instant::now();
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                if last_progress.elapsed() >= timeout {
                    break;
                }
            }
            Err(e) => return Err(e),
        }
    }

    Ok(read)
}
