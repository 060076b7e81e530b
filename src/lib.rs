//! A synchronous HTTP/1.x client: URL parsing, request composition, a
//! streaming response parser, transparent chunked-transfer decoding, and a
//! keep-alive/redirect connection-lifecycle policy, all driven over a
//! pluggable transport so the caller supplies TLS rather than this crate
//! implementing it.
//!
//! See [`Client`] for the entry point.

mod bounds;
mod chunked;
mod cookies;
mod error;
mod options;
mod request;
mod response;
mod status;
mod transport;
mod url;

#[cfg(feature = "native-tls")]
mod native_tls_transport;
#[cfg(feature = "rustls")]
mod rustls_transport;

mod client;

pub use client::Client;
pub use cookies::CookieJar;
pub use error::{Error, Result};
#[cfg(feature = "native-tls")]
pub use native_tls_transport::NativeTlsConnector;
pub use options::{ClientOptions, HeadCallback, Method, Range};
#[cfg(feature = "rustls")]
pub use rustls_transport::RustlsConnector;
pub use status::{Status, Version};
pub use transport::{SecureConnector, Transport};
