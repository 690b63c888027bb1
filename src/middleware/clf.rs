//! Apache Common and Combined Log Format lines, extended with latency.
//!
//! ```text
//! common:   host - user [02/Jan/2017:20:07:27 +0100] "GET / HTTP/1.1" 200 13 12.000ms
//! combined: <common> "referrer" "user-agent"
//! ```
//!
//! Only the request target, referrer and user agent go through
//! [`append_quoted`]; the remaining fields come from the connection or from
//! the HTTP parser and are written as-is.

use std::borrow::Cow;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use http::{HeaderValue, Method, Uri, Version};
use percent_encoding::percent_decode_str;

use super::escape::append_quoted;
use crate::request::Request;

const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Everything one access-log line is made of.
///
/// Built only once the downstream handler has returned, so every field is
/// final.
#[derive(Clone, Debug)]
pub struct LogRecord<'a> {
    /// Peer address without its port.
    pub remote_host: &'a str,
    /// User-info name from the request URI, or `-`.
    pub username: &'a str,
    /// When the request arrived.
    pub timestamp: DateTime<FixedOffset>,
    pub method: &'a str,
    /// Unescaped request target.
    pub target: &'a str,
    /// `HTTP/1.1`, `HTTP/2.0`, ...
    pub protocol: &'a str,
    pub status: u16,
    /// Response body size in bytes.
    pub size: usize,
    pub elapsed: Duration,
    /// Raw `Referer` header, empty when absent.
    pub referrer: &'a [u8],
    /// Raw `User-Agent` header, empty when absent.
    pub user_agent: &'a [u8],
}

impl LogRecord<'_> {
    /// The Common Log Format line, without a trailing newline.
    pub fn common_line(&self) -> String {
        let mut line = String::with_capacity(
            3 * (self.remote_host.len()
                + self.username.len()
                + self.method.len()
                + self.target.len()
                + self.protocol.len()
                + 50)
                / 2,
        );
        self.append_common(&mut line);
        line
    }

    /// The Combined Log Format line, without a trailing newline.
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use chrono::{FixedOffset, TimeZone};
    /// use tsu_accesslog::middleware::LogRecord;
    ///
    /// let record = LogRecord {
    ///     remote_host: "::1",
    ///     username: "-",
    ///     timestamp: FixedOffset::east_opt(3600).unwrap()
    ///         .with_ymd_and_hms(2017, 1, 2, 20, 7, 27).unwrap(),
    ///     method: "GET",
    ///     target: "/",
    ///     protocol: "HTTP/1.1",
    ///     status: 200,
    ///     size: 13,
    ///     elapsed: Duration::from_millis(12),
    ///     referrer: b"",
    ///     user_agent: b"curl/7.51.0",
    /// };
    ///
    /// assert_eq!(
    ///     record.combined_line(),
    ///     r#"::1 - - [02/Jan/2017:20:07:27 +0100] "GET / HTTP/1.1" 200 13 12.000ms "" "curl/7.51.0""#,
    /// );
    /// ```
    pub fn combined_line(&self) -> String {
        let mut line = self.common_line();
        line.push_str(" \"");
        append_quoted(&mut line, self.referrer);
        line.push_str("\" \"");
        append_quoted(&mut line, self.user_agent);
        line.push('"');
        line
    }

    fn append_common(&self, line: &mut String) {
        let mut num = itoa::Buffer::new();

        line.push_str(self.remote_host);
        line.push_str(" - ");
        line.push_str(self.username);
        line.push_str(" [");
        line.push_str(&self.timestamp.format(TIMESTAMP_FORMAT).to_string());
        line.push_str("] \"");
        line.push_str(self.method);
        line.push(' ');
        append_quoted(line, self.target.as_bytes());
        line.push(' ');
        line.push_str(self.protocol);
        line.push_str("\" ");
        line.push_str(num.format(self.status));
        line.push(' ');
        line.push_str(num.format(self.size));
        line.push(' ');
        line.push_str(&format_elapsed(self.elapsed));
    }
}

/// Fractional milliseconds with three decimals: 500µs is `0.500ms`.
pub(crate) fn format_elapsed(elapsed: Duration) -> String {
    let ms = elapsed.as_nanos() as f64 / 1e6;
    format!("{ms:.3}ms")
}

/// The request-side half of a [`LogRecord`], taken before the request is
/// moved into the downstream handler.
pub(crate) struct RequestFields {
    remote_host: String,
    username: String,
    method: Method,
    target: String,
    protocol: &'static str,
    referrer: Option<HeaderValue>,
    user_agent: Option<HeaderValue>,
}

impl RequestFields {
    pub(crate) fn capture(req: &Request) -> Self {
        Self {
            remote_host: remote_host(req.remote_addr()).to_owned(),
            username: username(req.uri()).map_or_else(|| "-".to_owned(), Cow::into_owned),
            method: req.method().clone(),
            target: request_target(req).into_owned(),
            protocol: protocol(req.version()),
            referrer: req.headers().get(http::header::REFERER).cloned(),
            user_agent: req.headers().get(http::header::USER_AGENT).cloned(),
        }
    }

    /// Completes the record with the response outcome.
    pub(crate) fn record(
        &self,
        timestamp: DateTime<FixedOffset>,
        status: u16,
        size: usize,
        elapsed: Duration,
    ) -> LogRecord<'_> {
        LogRecord {
            remote_host: &self.remote_host,
            username: &self.username,
            timestamp,
            method: self.method.as_str(),
            target: &self.target,
            protocol: self.protocol,
            status,
            size,
            elapsed,
            referrer: self.referrer.as_ref().map_or(b"".as_slice(), HeaderValue::as_bytes),
            user_agent: self.user_agent.as_ref().map_or(b"".as_slice(), HeaderValue::as_bytes),
        }
    }
}

/// Strips a trailing `:port` from a peer address, unwrapping `[v6]` hosts.
/// Anything that does not look like `host:port` is returned unchanged.
pub(crate) fn remote_host(addr: &str) -> &str {
    split_host_port(addr).unwrap_or(addr)
}

fn split_host_port(addr: &str) -> Option<&str> {
    let (host, _port) = addr.rsplit_once(':')?;
    let host = match host.strip_prefix('[') {
        Some(inner) => inner.strip_suffix(']')?,
        None if host.contains(':') => return None,
        None => host,
    };
    if host.contains(['[', ']']) {
        return None;
    }
    Some(host)
}

/// The user name embedded in the URI authority (`user[:password]@host`),
/// percent-decoded, if present and non-empty. Invalid UTF-8 after decoding
/// is replaced with U+FFFD.
pub(crate) fn username(uri: &Uri) -> Option<Cow<'_, str>> {
    let (user_info, _) = uri.authority()?.as_str().rsplit_once('@')?;
    let name = user_info.split_once(':').map_or(user_info, |(name, _)| name);
    let name = percent_decode_str(name).decode_utf8_lossy();
    (!name.is_empty()).then_some(name)
}

/// HTTP/2 `CONNECT` requests name their target in `:authority` and carry no
/// path (RFC 7540 §8.3), so the authority replaces the request-line target.
/// An empty result falls back to a target rebuilt from the parsed URI.
pub(crate) fn request_target(req: &Request) -> Cow<'_, str> {
    let mut target = req.target();
    if req.version() == Version::HTTP_2 && *req.method() == Method::CONNECT {
        target = req.host().unwrap_or("");
    }
    if !target.is_empty() {
        return Cow::Borrowed(target);
    }

    let uri = req.uri();
    let path = match uri.path() {
        "" => "/",
        path => path,
    };
    match uri.query() {
        Some(query) => Cow::Owned(format!("{path}?{query}")),
        None => Cow::Borrowed(path),
    }
}

pub(crate) fn protocol(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}
