use thiserror::Error;

/// Everything that can go wrong while opening a connection, sending a
/// request, or reading a response.
///
/// This mirrors the failure categories in the component design: a parse
/// error, an HTTP error (status in `[400, 600)`), a transport error, an idle
/// timeout, a chunked-framing error, or a missing TLS adapter. There is no
/// automatic retry anywhere in this crate: every variant here is terminal for
/// the `open` call that produced it.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The supplied URL was empty or could not be parsed into
    /// `scheme://host[:port]path`.
    #[error("invalid url")]
    InvalidUrl,

    /// A `Location` redirect target could not be resolved against the
    /// current URL.
    #[error("invalid redirect target")]
    InvalidRedirect,

    /// The transport returned a negative (fatal) result, or a write did not
    /// complete in full.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// `is_https` was set but no secure transport adapter was supplied.
    #[error("https requested but no secure transport adapter is configured")]
    MissingTlsAdapter,

    /// The status line was missing, malformed, or used an unsupported
    /// HTTP version.
    #[error("malformed status line")]
    MalformedStatusLine,

    /// The response used an HTTP version other than 1.0 or 1.1.
    #[error("unsupported http version")]
    UnsupportedVersion,

    /// No line of the response was read before EOF.
    #[error("connection closed before a response was received")]
    NoResponse,

    /// A header line, or the full header block, exceeded its bound.
    #[error("response header exceeded the configured bound")]
    HeadersTooLong,

    /// The response carried a status in `[400, 600)`, or a `Location`
    /// header arrived on a non-redirect status.
    #[error("http error status {0}")]
    HttpStatus(u16),

    /// The chunked-encoding framing was violated: a missing trailing CRLF,
    /// or a chunk-size line that did not parse. This becomes the stream
    /// terminator for `read`, surfaced as `-1` at that layer; it is only
    /// ever observed here if the caller inspects the underlying error.
    #[error("chunked transfer-encoding framing error")]
    ChunkedFraming,

    /// The no-progress idle timeout elapsed while writing the request head
    /// or body, or while reading the response head.
    #[error("idle timeout after {0}ms with no progress")]
    IdleTimeout(u64),

    /// The caller-supplied `head_callback` returned `false`, aborting the
    /// response parse.
    #[error("aborted by head callback")]
    Aborted,
}

/// this crate's result type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for errors that close the underlying transport (everything
    /// except a plain HTTP error status, which preserves the connection per
    /// the server's `Connection` response header).
    pub fn closes_transport(&self) -> bool {
        !matches!(self, Error::HttpStatus(_))
    }
}
