//! URL parsing and redirect resolution (component C, spec §4.C).
//!
//! This is a purpose-built, bounded parser rather than a wrapper around a
//! general-purpose URL crate: spec invariant 5 requires the URL buffer to
//! always be a canonical `scheme://host[:port]path` rebuilt from the current
//! option fields, and spec §6 requires silent truncation to fixed bounds. A
//! generic allocating URL type does not model either of those cleanly, so
//! this module works directly on the client's `host`/`port`/`path` fields. See
//! DESIGN.md for the rationale.

use crate::bounds::{bounded, HOST_MAX, PATH_MAX, URL_MAX};

/// An absolute URL split into the fields the client tracks (spec §3 Options:
/// `host`, `port`, `path`, `is_https`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Absolute {
    pub is_https: bool,
    pub host: String,
    pub port: u16,
    pub path: String,
}

/// Default port for a scheme (spec invariant 3: 80 plain, 443 https).
pub fn default_port(is_https: bool) -> u16 {
    if is_https {
        443
    } else {
        80
    }
}

/// Parse an absolute URL of the form `http://host[:port][path]` or
/// `https://host[:port][path]` (spec §4.C points 1, 2, 4).
///
/// Returns `None` on empty input or a string with neither recognized scheme.
/// An empty path is legal (it is later emitted as `/` by the request
/// composer, spec §9 open question).
pub fn parse_absolute(raw: &str) -> Option<Absolute> {
    if raw.is_empty() {
        return None;
    }

    let (is_https, rest) = if let Some(rest) = raw.strip_prefix("http://") {
        (false, rest)
    } else if let Some(rest) = raw.strip_prefix("https://") {
        (true, rest)
    } else {
        return None;
    };

    let authority_end = rest.find('/').unwrap_or(rest.len());
    let (authority, path) = rest.split_at(authority_end);

    let (host, port) = match authority.find(':') {
        Some(colon) => {
            let host = &authority[..colon];
            let port_str = &authority[colon + 1..];
            let port: u32 = port_str.parse().ok()?;
            if host.is_empty() || port == 0 || port > u16::MAX as u32 {
                return None;
            }
            (host, port as u16)
        }
        None => {
            if authority.is_empty() {
                return None;
            }
            (authority, default_port(is_https))
        }
    };

    Some(Absolute {
        is_https,
        host: bounded(host, HOST_MAX),
        port,
        path: bounded(path, PATH_MAX),
    })
}

/// Resolve a `Location` value against the current request path, per spec
/// §4.C point 3:
///
/// - an absolute path (`/...`) replaces `path` outright.
/// - a relative reference replaces the last path segment (the text after the
///   final `/`); if there is no `/`, it is written after the leading slash.
///
/// This is only a legal interpretation of `location` when the client has
/// already redirected at least once (`status.redirected`); the caller is
/// responsible for gating on that.
pub fn resolve_relative(current_path: &str, location: &str) -> Option<String> {
    if location.is_empty() {
        return None;
    }

    if location.starts_with('/') {
        return Some(bounded(location, PATH_MAX));
    }

    let resolved = match current_path.rfind('/') {
        Some(slash) => format!("{}{}", &current_path[..=slash], location),
        None => format!("/{location}"),
    };

    Some(bounded(&resolved, PATH_MAX))
}

/// Resolve a `Location` header value against the connection a response
/// arrived on (spec §4.C): an absolute `http(s)://...` value parses
/// independently; anything else is a relative reference resolved against
/// `current`'s path, keeping `current`'s host/port/scheme.
///
/// The second element of the result is `true` when `location` was an
/// absolute URL (spec §4.C point 4: the caller must store that case's text
/// "verbatim" rather than a rebuilt canonical string) and `false` when it was
/// resolved as a relative reference (point 3: the caller rebuilds
/// `scheme://host[:port]path` instead).
pub fn resolve_location(current: &Absolute, location: &str) -> Option<(Absolute, bool)> {
    if location.starts_with("http://") || location.starts_with("https://") {
        return parse_absolute(location).map(|absolute| (absolute, true));
    }

    let path = resolve_relative(&current.path, location)?;
    let absolute = Absolute {
        is_https: current.is_https,
        host: current.host.clone(),
        port: current.port,
        path,
    };
    Some((absolute, false))
}

/// Rebuild the canonical URL string `scheme://host[:port]path`, omitting the
/// port when it is the scheme's default (spec invariant 5).
pub fn canonical_url(is_https: bool, host: &str, port: u16, path: &str) -> String {
    let scheme = if is_https { "https" } else { "http" };
    let path = if path.is_empty() { "/" } else { path };

    let mut url = if port == default_port(is_https) {
        format!("{scheme}://{host}{path}")
    } else {
        format!("{scheme}://{host}:{port}{path}")
    };

    crate::bounds::truncate_at_boundary(&mut url, URL_MAX);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_absolute_http() {
        let u = parse_absolute("http://example.com/a/b").unwrap();
        assert!(!u.is_https);
        assert_eq!(u.host, "example.com");
        assert_eq!(u.port, 80);
        assert_eq!(u.path, "/a/b");
    }

    #[test]
    fn parses_absolute_https_with_port() {
        let u = parse_absolute("https://example.com:8443/x").unwrap();
        assert!(u.is_https);
        assert_eq!(u.port, 8443);
        assert_eq!(u.path, "/x");
    }

    #[test]
    fn empty_path_is_legal() {
        let u = parse_absolute("http://example.com").unwrap();
        assert_eq!(u.path, "");
    }

    #[test]
    fn rejects_empty_and_unknown_scheme() {
        assert!(parse_absolute("").is_none());
        assert!(parse_absolute("ftp://example.com/").is_none());
    }

    #[test]
    fn resolves_absolute_path_redirect() {
        assert_eq!(
            resolve_relative("/old/page", "/new/path").as_deref(),
            Some("/new/path")
        );
    }

    #[test]
    fn resolves_relative_redirect_replacing_last_segment() {
        assert_eq!(
            resolve_relative("/old/page", "sibling").as_deref(),
            Some("/old/sibling")
        );
    }

    #[test]
    fn resolves_relative_redirect_with_no_slash() {
        assert_eq!(resolve_relative("nofirstslash", "x").as_deref(), Some("/x"));
    }

    #[test]
    fn round_trips_through_canonical_url() {
        for raw in [
            "http://example.com/a/b",
            "https://example.com:8443/x",
            "http://example.com:8080/",
        ] {
            let parsed = parse_absolute(raw).unwrap();
            let rebuilt = canonical_url(parsed.is_https, &parsed.host, parsed.port, &parsed.path);
            let reparsed = parse_absolute(&rebuilt).unwrap();
            assert_eq!(parsed, reparsed);
        }
    }

    #[test]
    fn resolve_location_handles_absolute_and_relative() {
        let current = Absolute {
            is_https: false,
            host: "a.test".to_owned(),
            port: 80,
            path: "/old/page".to_owned(),
        };
        let (absolute, was_absolute) = resolve_location(&current, "http://b.test/y").unwrap();
        assert!(was_absolute);
        assert_eq!(absolute.host, "b.test");
        assert_eq!(absolute.path, "/y");

        let (relative, was_absolute) = resolve_location(&current, "/new/path").unwrap();
        assert!(!was_absolute);
        assert_eq!(relative.host, "a.test");
        assert_eq!(relative.path, "/new/path");
    }

    #[test]
    fn canonical_url_omits_default_port() {
        assert_eq!(
            canonical_url(false, "example.com", 80, "/x"),
            "http://example.com/x"
        );
        assert_eq!(
            canonical_url(true, "example.com", 443, "/x"),
            "https://example.com/x"
        );
        assert_eq!(
            canonical_url(false, "example.com", 8080, "/x"),
            "http://example.com:8080/x"
        );
    }
}
