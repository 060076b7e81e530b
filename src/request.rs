//! Request composer (component D, spec §4.D `head_format`).

use crate::options::{Method, Range};
use crate::url::default_port;

/// Case-insensitive search for a header name at the start of a line within
/// the caller-supplied header blob, followed immediately by `:` (spec §4.D:
/// "case-insensitive substring match followed by strict `:` check,
/// re-scanning past mismatches -- values that incidentally contain a header
/// name must not cause a false positive").
pub fn header_present(blob: &str, name: &str) -> bool {
    if blob.is_empty() {
        return false;
    }
    let haystack = blob.to_ascii_lowercase();
    let needle = name.to_ascii_lowercase();
    let bytes = haystack.as_bytes();

    let mut search_from = 0;
    while let Some(offset) = haystack[search_from..].find(&needle) {
        let idx = search_from + offset;
        let at_line_start = idx == 0 || bytes[idx - 1] == b'\n';
        let followed_by_colon = bytes.get(idx + needle.len()) == Some(&b':');
        if at_line_start && followed_by_colon {
            return true;
        }
        search_from = idx + 1;
    }
    false
}

/// Build the full request head, ending in a blank `CRLF` (spec §4.D).
#[allow(clippy::too_many_arguments)]
pub fn build_head(
    method: Method,
    path: &str,
    host: &str,
    port: u16,
    is_https: bool,
    range: Range,
    post_size: Option<usize>,
    cookie_header: Option<&str>,
    custom_head: &str,
    keep_alive: bool,
) -> String {
    let mut head = String::with_capacity(256 + custom_head.len());

    let path = if path.is_empty() { "/" } else { path };
    head.push_str(method.as_str());
    head.push(' ');
    head.push_str(path);
    head.push_str(" HTTP/1.1\r\n");

    if !header_present(custom_head, "host") {
        head.push_str("Host: ");
        head.push_str(host);
        if port != default_port(is_https) {
            head.push(':');
            head.push_str(&port.to_string());
        }
        head.push_str("\r\n");
    }

    if !header_present(custom_head, "accept") {
        head.push_str("Accept: */*\r\n");
    }

    if !range.is_trivial() {
        head.push_str("Range: bytes=");
        if range.begin > 0 && range.end > range.begin {
            head.push_str(&format!("{}-{}", range.begin, range.end));
        } else if range.begin > 0 && range.end == 0 {
            head.push_str(&format!("{}-", range.begin));
        } else if range.begin == 0 && range.end > 0 {
            head.push_str(&format!("0-{}", range.end));
        }
        head.push_str("\r\n");
    }

    if method == Method::Post {
        if let Some(size) = post_size {
            head.push_str("Content-Length: ");
            head.push_str(&size.to_string());
            head.push_str("\r\n");
        }
    }

    if let Some(cookie_value) = cookie_header {
        if !cookie_value.is_empty() {
            head.push_str("Cookie: ");
            head.push_str(cookie_value);
            head.push_str("\r\n");
        }
    }

    head.push_str(custom_head);
    if !custom_head.is_empty() && !custom_head.ends_with("\r\n") {
        head.push_str("\r\n");
    }

    if !header_present(custom_head, "connection") {
        head.push_str(if keep_alive {
            "Connection: keep-alive\r\n"
        } else {
            "Connection: close\r\n"
        });
    }

    head.push_str("\r\n");
    head
}
