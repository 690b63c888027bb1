//! Access-log middleware.
//!
//! One line per request, written synchronously to a sink the caller owns:
//!
//! ```rust,no_run
//! use http::Method;
//! use tsu_accesslog::middleware::logger;
//! use tsu_accesslog::{Request, Response, Router, Server};
//!
//! # async fn hello(_: Request) -> Response { Response::text("hello") }
//! # async fn run() -> Result<(), tsu_accesslog::Error> {
//! let app = Router::new()
//!     .on(Method::GET, "/", hello)
//!     .layer(logger::combined(std::io::stderr()));
//!
//! Server::bind("0.0.0.0:3000").serve(app).await
//! # }
//! ```
//!
//! # Sinks
//!
//! The sink is shared by every in-flight request, so it must be writable
//! through a shared reference: `for<'a> &'a W: io::Write`. `Stderr`,
//! `Stdout` and `File` qualify. Each line is handed over in a single
//! `write_all`; whether concurrent lines can interleave is up to the sink
//! (an `O_APPEND` file or the locked std streams keep them whole).
//!
//! # Write failures
//!
//! A failed write is dropped. The response goes out unchanged and the
//! failure is only reported as a `debug` tracing event: access logging must
//! never fail a request.

use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use tracing::debug;

use super::clf::{LogRecord, RequestFields};
use super::{Middleware, Next};
use crate::error::Error;
use crate::handler::BoxFuture;
use crate::request::Request;

/// Which Apache log layout to emit.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Format {
    /// `host - user [time] "request" status size latency`
    Common,
    /// Common, then `"referrer" "user-agent"`.
    #[default]
    Combined,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Combined => "combined",
        }
    }

    /// Renders `record` in this layout, without a trailing newline.
    pub fn line(self, record: &LogRecord<'_>) -> String {
        match self {
            Self::Common => record.common_line(),
            Self::Combined => record.combined_line(),
        }
    }
}

/// Parses `common` or `combined`, ignoring ASCII case.
impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("common") {
            Ok(Self::Common)
        } else if s.eq_ignore_ascii_case("combined") {
            Ok(Self::Combined)
        } else {
            Err(Error::UnknownFormat(s.to_owned()))
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access-log middleware writing [`Format`] lines to `W`.
pub struct Logger<W> {
    format: Format,
    out: Arc<W>,
}

impl<W> Logger<W>
where
    W: Send + Sync + 'static,
    for<'a> &'a W: Write,
{
    pub fn new(format: Format, out: W) -> Self {
        Self { format, out: Arc::new(out) }
    }

    pub fn format(&self) -> Format { self.format }
}

/// Logs every request in Common Log Format, plus latency, to `out`.
pub fn common<W>(out: W) -> Logger<W>
where
    W: Send + Sync + 'static,
    for<'a> &'a W: Write,
{
    Logger::new(Format::Common, out)
}

/// Logs every request in Combined Log Format, plus latency, to `out`.
pub fn combined<W>(out: W) -> Logger<W>
where
    W: Send + Sync + 'static,
    for<'a> &'a W: Write,
{
    Logger::new(Format::Combined, out)
}

impl<W> Middleware for Logger<W>
where
    W: Send + Sync + 'static,
    for<'a> &'a W: Write,
{
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        let format = self.format;
        let out = Arc::clone(&self.out);

        Box::pin(async move {
            let started_at = Local::now();
            let start = Instant::now();
            let fields = RequestFields::capture(&req);

            let response = next.run(req).await;
            let elapsed = start.elapsed();

            let record = fields.record(
                started_at.fixed_offset(),
                response.status_code().as_u16(),
                response.body_len(),
                elapsed,
            );
            let mut line = format.line(&record);
            line.push('\n');

            // Deliberately not propagated; see the module docs.
            if let Err(e) = (&*out).write_all(line.as_bytes()) {
                debug!(format = %format, "access log write failed: {e}");
            }

            response
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Mutex;

    use http::{Method, StatusCode, Version};

    use super::*;
    use crate::handler::Handler;
    use crate::response::Response;

    /// In-memory sink that can be inspected after the logger has taken it.
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }

        fn writes(&self) -> usize {
            self.text().matches('\n').count()
        }
    }

    impl Write for &Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> { Ok(()) }
    }

    struct Broken;

    impl Write for &Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
        }

        fn flush(&mut self) -> io::Result<()> { Ok(()) }
    }

    fn next(handler: impl Handler) -> Next {
        Next { handler: handler.into_boxed_handler() }
    }

    async fn hello(_req: Request) -> Response {
        Response::text("hello world!\n")
    }

    fn curl_get() -> Request {
        Request::for_test(
            http::Request::builder().uri("/").header("user-agent", "curl/7.51.0"),
            "[::1]:54321",
        )
    }

    #[test]
    fn format_names_parse_case_insensitively() {
        assert_eq!("common".parse::<Format>().unwrap(), Format::Common);
        assert_eq!("Combined".parse::<Format>().unwrap(), Format::Combined);
        assert!(matches!("json".parse::<Format>(), Err(Error::UnknownFormat(name)) if name == "json"));
        assert_eq!(Format::Common.to_string(), "common");
        assert_eq!(Format::default(), Format::Combined);
    }

    #[tokio::test]
    async fn combined_logger_writes_one_line() {
        let sink = Capture::default();
        let logger = combined(sink.clone());

        let res = logger.handle(curl_get(), next(hello)).await;
        assert_eq!(res.status_code(), StatusCode::OK);

        let text = sink.text();
        assert_eq!(sink.writes(), 1);
        assert!(text.starts_with("::1 - - ["), "{text}");
        assert!(text.contains(r#"] "GET / HTTP/1.1" 200 13 "#), "{text}");
        assert!(text.ends_with("ms \"\" \"curl/7.51.0\"\n"), "{text}");
    }

    #[tokio::test]
    async fn common_logger_omits_referrer_and_agent() {
        let sink = Capture::default();
        let logger = common(sink.clone());
        assert_eq!(logger.format(), Format::Common);

        logger.handle(curl_get(), next(hello)).await;

        let text = sink.text();
        assert!(text.contains(r#""GET / HTTP/1.1" 200 13 "#), "{text}");
        assert!(text.ends_with("ms\n"), "{text}");
        assert!(!text.contains("curl"), "{text}");
    }

    #[tokio::test]
    async fn status_and_size_come_from_the_response() {
        async fn missing(_req: Request) -> StatusCode {
            StatusCode::NOT_FOUND
        }

        let sink = Capture::default();
        let logger = common(sink.clone());
        logger.handle(curl_get(), next(missing)).await;

        assert!(sink.text().contains("\" 404 0 "), "{}", sink.text());
    }

    #[tokio::test]
    async fn latency_covers_the_handler() {
        async fn slow(_req: Request) -> Response {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            Response::text("done")
        }

        let sink = Capture::default();
        let logger = common(sink.clone());
        logger.handle(curl_get(), next(slow)).await;

        let text = sink.text();
        let latency = text.trim_end().rsplit(' ').next().unwrap();
        let ms: f64 = latency.strip_suffix("ms").unwrap().parse().unwrap();
        assert!(ms >= 20.0, "{text}");
        assert_eq!(latency.split('.').nth(1).map(str::len), Some(5), "{text}");
    }

    #[tokio::test]
    async fn write_failure_does_not_affect_the_response() {
        let logger = combined(Broken);

        let res = logger.handle(curl_get(), next(hello)).await;

        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"hello world!\n");
    }

    #[tokio::test]
    async fn http2_connect_logs_the_authority() {
        async fn tunnel(_req: Request) -> Response {
            Response::status(StatusCode::OK)
        }

        let sink = Capture::default();
        let logger = combined(sink.clone());
        let req = Request::for_test(
            http::Request::builder()
                .method(Method::CONNECT)
                .version(Version::HTTP_2)
                .uri("example.com:443"),
            "192.0.2.1:50000",
        );
        logger.handle(req, next(tunnel)).await;

        let text = sink.text();
        assert!(text.contains(r#""CONNECT example.com:443 HTTP/2.0" 200 0 "#), "{text}");
        assert!(text.ends_with("ms \"\" \"\"\n"), "{text}");
    }

    #[tokio::test]
    async fn each_request_gets_its_own_line() {
        let sink = Capture::default();
        let logger = common(sink.clone());

        for _ in 0..3 {
            logger.handle(curl_get(), next(hello)).await;
        }

        assert_eq!(sink.writes(), 3);
    }
}
