//! Buffer bounds recognized throughout the crate (spec §6 "Buffer bounds").
//!
//! The original C implementation stored these fields in fixed-size arrays and
//! truncated silently on overflow, always preserving a trailing NUL. This
//! crate uses owned `String`/`Vec<u8>` buffers instead, but preserves the
//! truncation behavior via [`truncate_at_boundary`] so that callers who relied
//! on the bound (rather than unbounded growth) see the same outcome.

/// Maximum length of a composed or parsed URL.
pub const URL_MAX: usize = 2048;
/// Maximum length of a host name.
pub const HOST_MAX: usize = 256;
/// Maximum length of a request path (including query string).
pub const PATH_MAX: usize = 1024;
/// Maximum length of the caller-supplied custom header blob.
pub const HEAD_MAX: usize = 8192;
/// Maximum length of one status or header line read from the wire.
pub const LINE_MAX: usize = 4096;
/// Maximum length of the `Content-Type` value retained on `Status`.
pub const CONTENT_TYPE_MAX: usize = 64;

/// Truncate `s` to at most `max` bytes, never splitting a UTF-8 code point.
pub fn truncate_at_boundary(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut cut = max;
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}

/// Build a bounded copy of `s`, truncating to `max` bytes on a char boundary.
pub fn bounded(s: &str, max: usize) -> String {
    let mut owned = s.to_owned();
    truncate_at_boundary(&mut owned, max);
    owned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_char_boundary() {
        let s = bounded("héllo", 2);
        assert!(s.len() <= 2);
        assert!(std::str::from_utf8(s.as_bytes()).is_ok());
    }

    #[test]
    fn leaves_short_strings_alone() {
        assert_eq!(bounded("short", 100), "short");
    }
}
