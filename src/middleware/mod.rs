//! Middleware layer.
//!
//! Middleware intercepts a request before routing hands it to a handler and
//! sees the response the handler produced. Register it with
//! [`Router::layer`](crate::Router::layer); it then wraps every request,
//! including the ones that end in `404 Not Found`.
//!
//! Built-in middleware:
//! - [`logger`] — Apache Common / Combined access log with request latency

use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;
use crate::response::Response;

mod clf;
mod escape;
pub mod logger;

pub use clf::LogRecord;
pub use logger::{Format, Logger};

/// Cross-cutting request processing.
///
/// `handle` receives the request and the rest of the chain. Call
/// [`Next::run`] to delegate, or return a response without calling it to
/// short-circuit.
///
/// ```rust
/// use tsu_accesslog::middleware::{Middleware, Next};
/// use tsu_accesslog::{BoxFuture, Request};
///
/// struct PoweredBy;
///
/// impl Middleware for PoweredBy {
///     fn handle(&self, req: Request, next: Next) -> BoxFuture {
///         Box::pin(async move {
///             let mut res = next.run(req).await;
///             res.set_header("x-powered-by", "tsu");
///             res
///         })
///     }
/// }
/// ```
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request, next: Next) -> BoxFuture;
}

/// The remainder of the middleware chain, ending in the route handler.
pub struct Next {
    handler: BoxedHandler,
}

impl Next {
    /// Hands the request to the next layer and waits for its response.
    pub async fn run(self, req: Request) -> Response {
        self.handler.call(req).await
    }
}

/// One middleware in front of the handler it wraps.
pub(crate) struct Layered {
    pub(crate) middleware: Arc<dyn Middleware>,
    pub(crate) next: BoxedHandler,
}

impl ErasedHandler for Layered {
    fn call(&self, req: Request) -> BoxFuture {
        let next = Next { handler: Arc::clone(&self.next) };
        self.middleware.handle(req, next)
    }
}
