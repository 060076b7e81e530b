//! Per-response state (spec §3 "Status"), owned by the client and reset on
//! every `open`.

/// HTTP version of a parsed status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
}

/// Per-response state. Everything here is reset at the start of every
/// top-level `open` call; `redirect_count` additionally survives each
/// individual redirect hop within that call (spec invariant and §4.G step 3).
#[derive(Debug, Default)]
pub struct Status {
    pub code: u16,
    pub version: Option<Version>,
    pub content_size: Option<u64>,
    pub document_size: Option<u64>,
    pub content_type: String,
    pub is_chunked: bool,
    pub is_seekable: bool,
    /// Server-confirmed keep-alive, from the response `Connection` header.
    pub keep_alive: bool,
    /// One-shot: set by a 301/302/303 `Location` header, consumed by the
    /// redirect loop in `open_host`.
    pub redirected: bool,
    /// Scheme of the connection this status describes.
    pub is_https: bool,
    pub redirect_count: u8,
    pub(crate) chunked_size: u64,
    pub(crate) chunked_read: u64,
}

impl Status {
    /// Full reset performed once per public `open` call (spec: "Status ...
    /// reset per `open`").
    pub(crate) fn reset_for_new_request(&mut self) {
        *self = Status::default();
    }

    /// Reset performed before each redirect hop within a single `open` call:
    /// everything is cleared except `redirect_count`, which the caller
    /// increments separately (spec §4.G step 3: "clear code, sizes, flags,
    /// line buffer, but preserve `redirect_count`").
    pub(crate) fn reset_for_attempt(&mut self) {
        let redirect_count = self.redirect_count;
        let is_https = self.is_https;
        *self = Status::default();
        self.redirect_count = redirect_count;
        self.is_https = is_https;
    }
}
