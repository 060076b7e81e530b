//! Cookie jar boundary (spec §6 "Cookie jar boundary").
//!
//! Persistent cookie storage is an explicit Non-goal (spec §1); this crate
//! only defines the narrow contract the request composer and response parser
//! consult. The jar itself is owned and implemented by the caller, in the
//! style of the teacher's `ClientHandler`-based `Cookies` handler
//! (`client/src/cookies.rs`) but stripped down to the plain get/set contract
//! spec.md specifies, rather than trillium's `cookie_store`-backed handler.

/// External collaborator consulted for outgoing `Cookie` headers and updated
/// from incoming `Set-Cookie` responses.
pub trait CookieJar: Send + Sync {
    /// Return the `Cookie` header value to send for this request, or `None`
    /// to omit the header entirely (spec §4.D point 6: "emit only if result
    /// non-empty").
    fn get(&self, host: &str, path: &str, is_secure: bool) -> Option<String>;

    /// Record a `Set-Cookie` response header value observed at `url`.
    fn set_from_url(&self, url: &str, header_value: &str);
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::CookieJar;
    use std::sync::Mutex;

    /// A trivial in-memory jar used by this crate's own tests. Not exported:
    /// real callers bring their own jar (spec's cookie jar is an external
    /// collaborator, not something this crate implements).
    #[derive(Default)]
    pub struct MemoryJar {
        cookies: Mutex<Vec<(String, String)>>,
    }

    impl CookieJar for MemoryJar {
        fn get(&self, _host: &str, _path: &str, _is_secure: bool) -> Option<String> {
            let cookies = self.cookies.lock().unwrap();
            if cookies.is_empty() {
                return None;
            }
            Some(
                cookies
                    .iter()
                    .map(|(name, value)| format!("{name}={value}"))
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        }

        fn set_from_url(&self, _url: &str, header_value: &str) {
            let Some((name, value)) = header_value.split_once('=') else {
                return;
            };
            let value = value.split(';').next().unwrap_or(value);
            self.cookies
                .lock()
                .unwrap()
                .push((name.to_owned(), value.to_owned()));
        }
    }
}
