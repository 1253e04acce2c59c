//! Request forge: turn a target URL plus user options into the fixed byte
//! string sent on every connection, and resolve the target host to a socket
//! address.
//!
//! Grounded on `examples/original_source/weighttp/src/weighttp.c::forge_request`
//! and `::resolve_host`. The teacher repo builds outgoing bytes the same way
//! in `http::response::Response` (a growable `Vec<u8>` filled by a builder),
//! which this module follows instead of the C original's manual
//! `strcpy`/`strcat`/`sprintf` byte arithmetic.

use crate::errors::SetupError;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

/// A target URL split into its load-generator-relevant parts.
///
/// Only `http://` is accepted; `https://` is a [`SetupError::UnsupportedScheme`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl ParsedUrl {
    /// Parses `scheme://host[:port][/path]`. Defaults: port 80, path `/`.
    pub fn parse(url: &str) -> Result<Self, SetupError> {
        let rest = if let Some(rest) = url.strip_prefix("http://") {
            rest
        } else if url.starts_with("https://") {
            return Err(SetupError::UnsupportedScheme);
        } else {
            return Err(SetupError::InvalidUrl(format!(
                "missing http:// scheme: {url}"
            )));
        };

        if rest.is_empty() {
            return Err(SetupError::InvalidUrl("empty host".into()));
        }

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };

        if authority.is_empty() {
            return Err(SetupError::InvalidUrl("empty host".into()));
        }

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port_str)) => {
                let port: u16 = port_str.parse().map_err(|_| {
                    SetupError::InvalidUrl(format!("invalid port: {port_str}"))
                })?;
                (host.to_string(), port)
            }
            None => (authority.to_string(), 80),
        };

        if host.is_empty() {
            return Err(SetupError::InvalidUrl("empty host".into()));
        }

        let path = if path.is_empty() {
            "/".to_string()
        } else {
            path.to_string()
        };

        Ok(ParsedUrl { host, port, path })
    }
}

/// Resolves `url.host:url.port` to one socket address, preferring `AF_INET`
/// unless `use_ipv6` is set (mirrors `resolve_host`'s single-address,
/// single-family selection — the original walks `getaddrinfo`'s list and
/// keeps the first match of the requested family).
pub fn resolve_host(url: &ParsedUrl, use_ipv6: bool) -> Result<SocketAddr, SetupError> {
    let query = (url.host.as_str(), url.port);
    let mut addrs = query
        .to_socket_addrs()
        .map_err(|_| SetupError::ResolutionFailed(url.host.clone()))?;

    let wants_v6 = use_ipv6;
    addrs
        .find(|addr| matches!((addr.ip(), wants_v6), (IpAddr::V6(_), true) | (IpAddr::V4(_), false)))
        .ok_or_else(|| SetupError::ResolutionFailed(url.host.clone()))
}

/// Builds the exact request bytes sent on every connection.
///
/// ```text
/// GET <path> HTTP/1.1\r\n
/// Host: <host-or-override>[:<port-if-not-80>]\r\n
/// User-Agent: weighttp/<version>\r\n   (omitted if user supplied one)
/// <each user header>\r\n
/// Connection: keep-alive\r\n\r\n       (or "Connection: close\r\n\r\n")
/// ```
///
/// A user-supplied `Host:` header replaces the derived one; a second
/// `Host:` header is a fatal [`SetupError::DuplicateHostHeader`].
pub fn forge_request(
    url: &ParsedUrl,
    headers: &[String],
    keep_alive: bool,
) -> Result<Vec<u8>, SetupError> {
    let mut host_header: Option<&str> = None;
    let mut has_user_agent = false;

    for header in headers {
        let name = header.split(':').next().unwrap_or("").trim();
        if name.eq_ignore_ascii_case("host") {
            if host_header.is_some() {
                return Err(SetupError::DuplicateHostHeader);
            }
            host_header = Some(header.as_str());
        } else if name.eq_ignore_ascii_case("user-agent") {
            has_user_agent = true;
        }
    }

    let mut buf = Vec::with_capacity(256);
    buf.extend_from_slice(b"GET ");
    buf.extend_from_slice(url.path.as_bytes());
    buf.extend_from_slice(b" HTTP/1.1\r\n");

    match host_header {
        Some(header) => {
            buf.extend_from_slice(header.as_bytes());
            buf.extend_from_slice(b"\r\n");
        }
        None => {
            buf.extend_from_slice(b"Host: ");
            buf.extend_from_slice(url.host.as_bytes());
            if url.port != 80 {
                buf.extend_from_slice(format!(":{}", url.port).as_bytes());
            }
            buf.extend_from_slice(b"\r\n");
        }
    }

    if !has_user_agent {
        buf.extend_from_slice(format!("User-Agent: weighttp/{}\r\n", env!("CARGO_PKG_VERSION")).as_bytes());
    }

    for header in headers {
        let name = header.split(':').next().unwrap_or("").trim();
        if name.eq_ignore_ascii_case("host") {
            continue;
        }
        buf.extend_from_slice(header.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    buf.extend_from_slice(if keep_alive {
        b"Connection: keep-alive\r\n\r\n"
    } else {
        b"Connection: close\r\n\r\n"
    });

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_url_defaults() {
        let url = ParsedUrl::parse("http://example.com").unwrap();
        assert_eq!(url.host, "example.com");
        assert_eq!(url.port, 80);
        assert_eq!(url.path, "/");
    }

    #[test]
    fn parse_url_port_and_path() {
        let url = ParsedUrl::parse("http://example.com:8080/a/b?q=1").unwrap();
        assert_eq!(url.host, "example.com");
        assert_eq!(url.port, 8080);
        assert_eq!(url.path, "/a/b?q=1");
    }

    #[test]
    fn parse_url_rejects_https() {
        assert!(matches!(
            ParsedUrl::parse("https://example.com"),
            Err(SetupError::UnsupportedScheme)
        ));
    }

    #[test]
    fn parse_url_rejects_missing_scheme() {
        assert!(matches!(
            ParsedUrl::parse("example.com"),
            Err(SetupError::InvalidUrl(_))
        ));
    }

    #[test]
    fn forge_default_headers() {
        let url = ParsedUrl::parse("http://example.com/").unwrap();
        let bytes = forge_request(&url, &[], true).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "GET / HTTP/1.1\r\n\
             Host: example.com\r\n\
             User-Agent: weighttp/0.1.0\r\n\
             Connection: keep-alive\r\n\r\n"
        );
    }

    #[test]
    fn forge_close_connection() {
        let url = ParsedUrl::parse("http://example.com/").unwrap();
        let bytes = forge_request(&url, &[], false).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.ends_with("Connection: close\r\n\r\n"));
    }

    #[test]
    fn forge_non_default_port_in_host() {
        let url = ParsedUrl::parse("http://example.com:8080/").unwrap();
        let bytes = forge_request(&url, &[], true).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("Host: example.com:8080\r\n"));
    }

    #[test]
    fn forge_user_supplied_host_and_user_agent() {
        // S6: exactly one Host: and one User-Agent:, no synthesized defaults.
        let url = ParsedUrl::parse("http://example.com/").unwrap();
        let headers = vec!["Host: example".to_string(), "User-Agent: ua".to_string()];
        let bytes = forge_request(&url, &headers, true).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(text.matches("Host:").count(), 1);
        assert_eq!(text.matches("User-Agent:").count(), 1);
        assert!(text.contains("Host: example\r\n"));
        assert!(text.contains("User-Agent: ua\r\n"));
    }

    #[test]
    fn forge_duplicate_host_is_fatal() {
        let url = ParsedUrl::parse("http://example.com/").unwrap();
        let headers = vec!["Host: a".to_string(), "Host: b".to_string()];
        assert!(matches!(
            forge_request(&url, &headers, true),
            Err(SetupError::DuplicateHostHeader)
        ));
    }
}
