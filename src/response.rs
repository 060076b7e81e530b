//! Response parser (component E, spec §4.E).
//!
//! Status-line and header parsing is driven line-by-line off a small buffered
//! reader over the transport, in the style of the teacher's `read_head`
//! (`client/src/conn.rs`), which scans a growing buffer for a boundary with
//! `memchr` rather than handing the raw socket to a full HTTP parser crate.

use std::io;
use std::time::{Duration, Instant};

use memchr::memchr;

use crate::bounds::{bounded, CONTENT_TYPE_MAX, LINE_MAX, URL_MAX};
use crate::cookies::CookieJar;
use crate::error::{Error, Result};
use crate::options::HeadCallback;
use crate::status::{Status, Version};
use crate::transport::Transport;
use crate::url::{canonical_url, resolve_location, Absolute};

/// Buffered line reader over a transport, bounded to `LINE_MAX` per line
/// (spec §4.E `read_line`).
pub struct ResponseReader<'t> {
    transport: &'t mut dyn Transport,
    buf: Vec<u8>,
    scanned: usize,
}

impl<'t> ResponseReader<'t> {
    pub fn new(transport: &'t mut dyn Transport) -> Self {
        Self {
            transport,
            buf: Vec::new(),
            scanned: 0,
        }
    }

    /// Pull one more round of bytes from the transport. `Ok(false)` means the
    /// peer closed the connection (true EOF) with nothing new delivered.
    fn fill(&mut self, timeout_ms: u64) -> Result<bool> {
        let mut chunk = [0u8; 512];
        let last_progress = Instant::now();
        let timeout = Duration::from_millis(timeout_ms);
        loop {
            match self.transport.read(&mut chunk) {
                Ok(0) => return Ok(false),
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return Ok(true);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if last_progress.elapsed() >= timeout {
                        return Err(Error::IdleTimeout(timeout_ms));
                    }
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    /// Read one line, stripping an optional trailing `\r` (spec §4.E
    /// `read_line`: "reads bytes until `\n`, strips an optional preceding
    /// `\r` ... returns null on EOF with no data"). `Ok(None)` is that EOF
    /// case; a line bound violation is [`Error::HeadersTooLong`].
    pub fn read_line(&mut self, timeout_ms: u64) -> Result<Option<String>> {
        loop {
            if let Some(pos) = memchr(b'\n', &self.buf[self.scanned..]) {
                let line_end = self.scanned + pos;
                let mut line: Vec<u8> = self.buf.drain(..=line_end).collect();
                line.pop(); // trailing \n
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                self.scanned = 0;
                return Ok(Some(bounded(&String::from_utf8_lossy(&line), LINE_MAX)));
            }

            self.scanned = self.buf.len();
            if self.buf.len() >= LINE_MAX {
                return Err(Error::HeadersTooLong);
            }

            if !self.fill(timeout_ms)? {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                let mut line = std::mem::take(&mut self.buf);
                self.scanned = 0;
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(Some(bounded(&String::from_utf8_lossy(&line), LINE_MAX)));
            }
        }
    }
}

/// Parse `HTTP/1.x CODE reason` into `(version, code)` (spec §4.E: "skip
/// characters until `.`, then read one digit for minor version ... skip
/// whitespace, parse status code as decimal").
fn parse_status_line(line: &str) -> Result<(Version, u16)> {
    let dot = line.find('.').ok_or(Error::MalformedStatusLine)?;
    let minor = line[dot + 1..]
        .chars()
        .next()
        .ok_or(Error::MalformedStatusLine)?;
    let version = match minor {
        '1' => Version::Http11,
        '0' => Version::Http10,
        _ => return Err(Error::UnsupportedVersion),
    };

    let rest = line[dot + 2..].trim_start();
    let code_str: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let code: u16 = code_str.parse().map_err(|_| Error::MalformedStatusLine)?;
    Ok((version, code))
}

/// Derive `content_size` from a parsed `Content-Range: bytes B-E/D` triple
/// per the spec §4.E 4-way rule, used only when no `Content-Length` header
/// has already set `content_size`. `B` and `E` are both inclusive byte
/// offsets (`bytes 100-199/1000` covers 100 bytes), so the two branches that
/// size a range from `B`/`E` add the missing `+1`.
fn content_size_from_range(begin: u64, end: u64, document: u64) -> u64 {
    if end > begin && begin > 0 {
        end - begin + 1
    } else if begin == 0 && end > 0 {
        end + 1
    } else if begin > 0 && end == 0 && document > begin {
        document - begin
    } else {
        document
    }
}

/// Parse a `Content-Range: bytes B-E/D` value into `(begin, end, document)`.
fn parse_content_range(value: &str) -> Option<(u64, u64, u64)> {
    let rest = value.strip_prefix("bytes ")?;
    let (range, document) = rest.split_once('/')?;
    let (begin, end) = range.split_once('-')?;
    Some((begin.parse().ok()?, end.parse().ok()?, document.trim().parse().ok()?))
}

/// Read and interpret one response (status line + headers), updating
/// `status` in place, handing `Set-Cookie` values to `cookies`, and invoking
/// `head_callback` with every raw line read. Returns the resolved redirect
/// target and the text that should become `options.url` for it, when the
/// response carried a 301/302/303 `Location` header: the original's
/// `split_url` stores an absolute `Location` value verbatim (spec §4.C point
/// 4) and only rebuilds a canonical `scheme://host[:port]path` string for a
/// relative one (point 3), so the two cases carry different url text even
/// though both resolve to an `Absolute`.
#[allow(clippy::too_many_arguments)]
pub fn read_response(
    reader: &mut ResponseReader<'_>,
    status: &mut Status,
    cookies: Option<&dyn CookieJar>,
    current: &Absolute,
    current_url: &str,
    mut head_callback: Option<&mut HeadCallback>,
    timeout_ms: u64,
) -> Result<Option<(Absolute, String)>> {
    status.is_https = current.is_https;
    let mut redirect_to: Option<(Absolute, String)> = None;
    let mut index = 0u32;

    loop {
        let line = reader.read_line(timeout_ms)?;
        let line = match line {
            Some(line) => line,
            None if index == 0 => return Err(Error::NoResponse),
            None => return Err(Error::Io(io::Error::from(io::ErrorKind::UnexpectedEof))),
        };
        log::trace!("< {line}");

        if let Some(callback) = head_callback.as_deref_mut() {
            if !callback(&line) {
                return Err(Error::Aborted);
            }
        }

        if index == 0 {
            let (version, code) = parse_status_line(&line)?;
            status.version = Some(version);
            status.code = code;
            log::debug!("response status {code}");
            if (400..600).contains(&code) {
                return Err(Error::HttpStatus(code));
            }
            index += 1;
            continue;
        }

        if line.is_empty() {
            break;
        }

        let Some(colon) = line.find(':') else {
            index += 1;
            continue;
        };
        let tag = &line[..colon];
        let value = line[colon + 1..].trim_start();

        match tag.to_ascii_lowercase().as_str() {
            "location" => {
                if matches!(status.code, 301 | 302 | 303) {
                    let (target, is_absolute) =
                        resolve_location(current, value).ok_or(Error::InvalidRedirect)?;
                    let url_text = if is_absolute {
                        bounded(value, URL_MAX)
                    } else {
                        canonical_url(target.is_https, &target.host, target.port, &target.path)
                    };
                    status.redirected = true;
                    redirect_to = Some((target, url_text));
                } else {
                    return Err(Error::InvalidRedirect);
                }
            }
            "connection" => {
                let closed = value.eq_ignore_ascii_case("close");
                if !closed && !value.eq_ignore_ascii_case("keep-alive") {
                    log::warn!("non-standard Connection value {value:?}, treating as keep-alive");
                }
                status.keep_alive = !closed;
            }
            "content-length" => {
                status.content_size = value.parse().ok();
            }
            "content-range" => {
                if let Some((begin, end, document)) = parse_content_range(value) {
                    status.is_seekable = true;
                    status.document_size = Some(document);
                    if status.content_size.is_none() {
                        status.content_size = Some(content_size_from_range(begin, end, document));
                    }
                }
            }
            "accept-ranges" => {
                status.is_seekable = true;
            }
            "content-type" => {
                status.content_type = bounded(value, CONTENT_TYPE_MAX);
            }
            "set-cookie" => {
                if let Some(jar) = cookies {
                    jar.set_from_url(current_url, value);
                }
            }
            "transfer-encoding" => {
                if value.eq_ignore_ascii_case("chunked") {
                    status.is_chunked = true;
                }
            }
            _ => {}
        }

        index += 1;
    }

    Ok(redirect_to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::test_support::MemoryJar;
    use std::collections::VecDeque;

    struct ScriptedTransport {
        chunks: VecDeque<Vec<u8>>,
    }

    impl Transport for ScriptedTransport {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(chunk) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    Ok(n)
                }
                None => Ok(0),
            }
        }

        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }
    }

    fn current() -> Absolute {
        Absolute {
            is_https: false,
            host: "example.com".to_owned(),
            port: 80,
            path: "/".to_owned(),
        }
    }

    #[test]
    fn parses_simple_200_with_content_length() {
        let mut transport = ScriptedTransport {
            chunks: VecDeque::from([b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\n".to_vec()]),
        };
        let mut reader = ResponseReader::new(&mut transport);
        let mut status = Status::default();
        let redirect = read_response(
            &mut reader,
            &mut status,
            None,
            &current(),
            "http://example.com/",
            None,
            1000,
        )
        .unwrap();
        assert!(redirect.is_none());
        assert_eq!(status.code, 200);
        assert_eq!(status.content_size, Some(5));
    }

    #[test]
    fn rejects_4xx_status() {
        let mut transport = ScriptedTransport {
            chunks: VecDeque::from([b"HTTP/1.1 404 Not Found\r\n\r\n".to_vec()]),
        };
        let mut reader = ResponseReader::new(&mut transport);
        let mut status = Status::default();
        let err = read_response(
            &mut reader,
            &mut status,
            None,
            &current(),
            "http://example.com/",
            None,
            1000,
        )
        .unwrap_err();
        assert!(matches!(err, Error::HttpStatus(404)));
    }

    #[test]
    fn redirect_resolves_absolute_location() {
        let mut transport = ScriptedTransport {
            chunks: VecDeque::from([
                b"HTTP/1.1 301 Moved\r\nLocation: http://b.test/y\r\nContent-Length: 0\r\n\r\n"
                    .to_vec(),
            ]),
        };
        let mut reader = ResponseReader::new(&mut transport);
        let mut status = Status::default();
        let redirect = read_response(
            &mut reader,
            &mut status,
            None,
            &current(),
            "http://a.test/x",
            None,
            1000,
        )
        .unwrap();
        let (redirect, url_text) = redirect.unwrap();
        assert_eq!(redirect.host, "b.test");
        assert_eq!(redirect.path, "/y");
        assert_eq!(url_text, "http://b.test/y");
        assert!(status.redirected);
    }

    #[test]
    fn relative_redirect_rebuilds_canonical_url_text() {
        let mut transport = ScriptedTransport {
            chunks: VecDeque::from([
                b"HTTP/1.1 302 Found\r\nLocation: /new/path\r\nContent-Length: 0\r\n\r\n".to_vec(),
            ]),
        };
        let mut reader = ResponseReader::new(&mut transport);
        let mut status = Status::default();
        let current = Absolute {
            is_https: false,
            host: "a.test".to_owned(),
            port: 80,
            path: "/old/page".to_owned(),
        };
        let (redirect, url_text) = read_response(
            &mut reader,
            &mut status,
            None,
            &current,
            "http://a.test/old/page",
            None,
            1000,
        )
        .unwrap()
        .unwrap();
        assert_eq!(redirect.path, "/new/path");
        assert_eq!(url_text, "http://a.test/new/path");
    }

    #[test]
    fn content_range_without_content_length_derives_sizes() {
        let mut transport = ScriptedTransport {
            chunks: VecDeque::from([
                b"HTTP/1.1 206 Partial\r\nContent-Range: bytes 100-199/1000\r\n\r\n".to_vec(),
            ]),
        };
        let mut reader = ResponseReader::new(&mut transport);
        let mut status = Status::default();
        read_response(
            &mut reader,
            &mut status,
            None,
            &current(),
            "http://example.com/",
            None,
            1000,
        )
        .unwrap();
        assert_eq!(status.content_size, Some(100));
        assert_eq!(status.document_size, Some(1000));
        assert!(status.is_seekable);
    }

    #[test]
    fn set_cookie_is_handed_to_jar() {
        let jar = MemoryJar::default();
        let mut transport = ScriptedTransport {
            chunks: VecDeque::from([
                b"HTTP/1.1 200 OK\r\nSet-Cookie: a=b\r\nContent-Length: 0\r\n\r\n".to_vec(),
            ]),
        };
        let mut reader = ResponseReader::new(&mut transport);
        let mut status = Status::default();
        read_response(
            &mut reader,
            &mut status,
            Some(&jar),
            &current(),
            "http://example.com/",
            None,
            1000,
        )
        .unwrap();
        assert_eq!(jar.get("example.com", "/", false).as_deref(), Some("a=b"));
    }

    #[test]
    fn head_callback_can_abort() {
        let mut transport = ScriptedTransport {
            chunks: VecDeque::from([b"HTTP/1.1 200 OK\r\nX-Foo: bar\r\n\r\n".to_vec()]),
        };
        let mut reader = ResponseReader::new(&mut transport);
        let mut status = Status::default();
        let mut callback: HeadCallback = Box::new(|line| !line.starts_with("X-Foo"));
        let err = read_response(
            &mut reader,
            &mut status,
            None,
            &current(),
            "http://example.com/",
            Some(&mut callback),
            1000,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Aborted));
    }
}
