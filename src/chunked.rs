//! Chunked transfer-encoding decoder (component F, spec §4.F), layered
//! transparently over the transport when `Status::is_chunked` is set.
//!
//! Grounded on the teacher's `http/src/received_body/chunked.rs`, adapted
//! from its async `AsyncRead`-driven decoder to this crate's synchronous,
//! idle-timeout-bounded transport reads.

use std::io;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::transport::Transport;

/// Per-stream chunk-framing counters, mirroring `Status::chunked_size`/
/// `chunked_read` (spec §3).
#[derive(Debug, Default)]
pub struct ChunkedState {
    size: u64,
    read: u64,
    /// Set once the terminating zero-size chunk has been observed.
    done: bool,
}

fn read_exact_timed(
    transport: &mut dyn Transport,
    buf: &mut [u8],
    timeout_ms: u64,
) -> Result<usize> {
    let mut read = 0;
    let last_progress = Instant::now();
    let timeout = Duration::from_millis(timeout_ms);
    while read < buf.len() {
        match transport.read(&mut buf[read..]) {
            Ok(0) => return Ok(read),
            Ok(n) => read += n,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                if last_progress.elapsed() >= timeout {
                    return Err(Error::IdleTimeout(timeout_ms));
                }
            }
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Ok(read)
}

/// Read one line terminated by `\n`, stripping a trailing `\r`, one byte at a
/// time. Chunk-size lines are short, so this favors simplicity over the
/// buffered approach used for the full response head.
fn read_line_timed(
    transport: &mut dyn Transport,
    timeout_ms: u64,
) -> Result<String> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        let n = read_exact_timed(transport, &mut byte, timeout_ms)?;
        if n == 0 {
            return Err(Error::ChunkedFraming);
        }
        if byte[0] == b'\n' {
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            return Ok(String::from_utf8_lossy(&line).into_owned());
        }
        line.push(byte[0]);
    }
}

/// Parse the leading hex digits of a chunk-size line, stopping at the first
/// non-hex-digit character (spec §9 open question: chunk extensions such as
/// `1a;foo=bar` are read as part of the line but ignored past the hex
/// prefix).
fn parse_chunk_size(line: &str) -> Option<u64> {
    let hex_len = line
        .chars()
        .take_while(|c| c.is_ascii_hexdigit())
        .count();
    if hex_len == 0 {
        return None;
    }
    u64::from_str_radix(&line[..hex_len], 16).ok()
}

impl ChunkedState {
    /// Current chunk's declared size, mirrored onto `Status::chunked_size`
    /// for introspection.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Bytes consumed from the current chunk, mirrored onto
    /// `Status::chunked_read`.
    pub fn progress(&self) -> u64 {
        self.read
    }

    /// Read up to `buf.len()` decoded body bytes (spec §4.F steps 1-3).
    /// Returns `Ok(0)` exactly once, at true end of body; subsequent calls
    /// after that also return `Ok(0)`.
    pub fn read(
        &mut self,
        transport: &mut dyn Transport,
        buf: &mut [u8],
        timeout_ms: u64,
    ) -> Result<usize> {
        if self.done {
            return Ok(0);
        }

        if self.size > 0 && self.read >= self.size {
            let mut crlf = [0u8; 2];
            let n = read_exact_timed(transport, &mut crlf, timeout_ms)?;
            if n != 2 || &crlf != b"\r\n" {
                return Err(Error::ChunkedFraming);
            }
            self.size = 0;
            self.read = 0;
        }

        if self.size == 0 {
            let line = read_line_timed(transport, timeout_ms)?;
            let size = parse_chunk_size(&line).ok_or(Error::ChunkedFraming)?;
            if size == 0 {
                self.done = true;
                return Ok(0);
            }
            self.size = size;
            self.read = 0;
        }

        let remaining = self.size - self.read;
        let want = (buf.len() as u64).min(remaining) as usize;
        let n = read_exact_timed(transport, &mut buf[..want], timeout_ms)?;
        self.read += n as u64;
        Ok(n)
    }
}
