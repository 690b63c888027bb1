//! # tsu-accesslog
//!
//! Apache-style access logging for services built on the tsu HTTP
//! framework. One line per request, in Common or Combined Log Format, each
//! extended with the request latency in fractional milliseconds:
//!
//! ```text
//! ::1 - - [02/Jan/2017:20:07:27 +0100] "GET / HTTP/1.1" 200 13 12.000ms "" "curl/7.51.0"
//! ```
//!
//! The crate ships the framework pieces the middleware plugs into:
//!
//! - Radix-tree routing via [`matchit`], one tree per method
//! - HTTP/1.1 and HTTP/2 on hyper and tokio, with the peer address attached
//!   to every [`Request`]
//! - A [`middleware`] layer, applied to every request including 404s
//! - Graceful shutdown on SIGTERM / Ctrl-C, draining in-flight requests
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::{Method, StatusCode};
//! use tsu_accesslog::middleware::logger;
//! use tsu_accesslog::{Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .on(Method::GET,  "/users/{id}", get_user)
//!         .on(Method::POST, "/users",      create_user)
//!         .layer(logger::combined(std::io::stdout()));
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#).into_bytes())
//! }
//!
//! async fn create_user(req: Request) -> Response {
//!     if req.body().is_empty() {
//!         return Response::status(StatusCode::BAD_REQUEST);
//!     }
//!     Response::builder()
//!         .status(StatusCode::CREATED)
//!         .header("location", "/users/99")
//!         .json(br#"{"id":"99"}"#.to_vec())
//! }
//! ```
//!
//! Log lines go to the sink handed to the middleware, never through
//! `tracing`; the server's own lifecycle events do use `tracing`.

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use error::Error;
pub use handler::{BoxFuture, Handler};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
