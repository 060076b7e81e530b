//! Caller-owned options (spec §3 "Options"), copied into the client on
//! `init`/`set_url` rather than a global; see the DESIGN NOTE in spec §9
//! ("Global default options become ... a builder that materializes defaults
//! -- never process-wide mutable state").

use std::sync::Arc;

use crate::bounds::{self, HEAD_MAX};
use crate::cookies::CookieJar;
use crate::transport::SecureConnector;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Head,
    Put,
    Options,
    Delete,
    Trace,
    Connect,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Head => "HEAD",
            Method::Put => "PUT",
            Method::Options => "OPTIONS",
            Method::Delete => "DELETE",
            Method::Trace => "TRACE",
            Method::Connect => "CONNECT",
        }
    }
}

impl Default for Method {
    fn default() -> Self {
        Method::Get
    }
}

/// A byte range request (spec §3: `{begin, end}` with sentinel 0).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub begin: u64,
    pub end: u64,
}

impl Range {
    /// A range is trivial (not emitted as a `Range:` header) when both ends
    /// are the sentinel zero.
    pub fn is_trivial(self) -> bool {
        self.begin == 0 && self.end == 0
    }
}

/// An optional per-line observer invoked while reading response headers
/// (spec §3 `head_callback`). Returning `false` aborts the request
/// (surfaced as [`crate::Error::Aborted`]).
pub type HeadCallback = Box<dyn FnMut(&str) -> bool + Send>;

const DEFAULT_MAX_REDIRECTS: u8 = 10;
const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Client-wide and per-request options (spec §3 "Options").
pub struct ClientOptions {
    pub method: Method,
    pub max_redirects: u8,
    pub timeout_ms: u64,
    pub host: String,
    pub path: String,
    pub url: String,
    pub port: u16,
    pub is_https: bool,
    pub blocking: bool,
    pub keep_alive: bool,
    pub range: Range,
    pub post_data: Option<Vec<u8>>,
    pub cookies: Option<Arc<dyn CookieJar>>,
    pub custom_head: String,
    pub head_callback: Option<HeadCallback>,
    pub secure_connector: Option<Arc<dyn SecureConnector>>,
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("method", &self.method)
            .field("max_redirects", &self.max_redirects)
            .field("timeout_ms", &self.timeout_ms)
            .field("host", &self.host)
            .field("path", &self.path)
            .field("url", &self.url)
            .field("port", &self.port)
            .field("is_https", &self.is_https)
            .field("blocking", &self.blocking)
            .field("keep_alive", &self.keep_alive)
            .field("range", &self.range)
            .field("post_data_len", &self.post_data.as_ref().map(Vec::len))
            .field("has_cookies", &self.cookies.is_some())
            .field("custom_head", &self.custom_head)
            .field("has_head_callback", &self.head_callback.is_some())
            .field("has_secure_connector", &self.secure_connector.is_some())
            .finish()
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            method: Method::Get,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            host: String::new(),
            path: String::new(),
            url: String::new(),
            port: 80,
            is_https: false,
            blocking: true,
            keep_alive: false,
            range: Range::default(),
            post_data: None,
            cookies: None,
            custom_head: String::new(),
            head_callback: None,
            secure_connector: None,
        }
    }
}

impl ClientOptions {
    /// Set the custom header blob, bounded to `HEAD_MAX` bytes (spec §6).
    pub fn set_custom_head(&mut self, head: impl Into<String>) {
        let mut head = head.into();
        bounds::truncate_at_boundary(&mut head, HEAD_MAX);
        self.custom_head = head;
    }
}
