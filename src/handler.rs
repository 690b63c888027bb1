//! Handler trait and type erasure.
//!
//! Routes and middleware hold handlers of many concrete types, so every
//! handler is stored behind one trait object:
//!
//! ```text
//! async fn hello(req: Request) -> Response { … }   ← user writes this
//!        ↓ router.on(Method::GET, "/", hello)
//! Arc::new(FnHandler(hello))                       ← BoxedHandler
//!        ↓ wrapped once per layer by the router
//! Arc::new(Layered { middleware, next })           ← still a BoxedHandler
//!        ↓ at request time
//! handler.call(req) -> BoxFuture                   ← one vtable dispatch per layer
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ───────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// Returned by [`Middleware::handle`](crate::middleware::Middleware::handle)
/// and by every erased handler. `Pin<Box<…>>` because the runtime polls the
/// future in place and must never move it after the first poll.
/// `Send + 'static` lets tokio move it across worker threads.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` because it appears in the return type of
/// [`Handler::into_boxed_handler`].
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
///
/// `Arc` because the router hands the same layered handler to every request
/// that matches a route: one atomic increment per lookup, no copying.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ─────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// Satisfied automatically by any `async fn name(req: Request) -> impl
/// IntoResponse`. The trait is sealed; only the blanket impl below exists.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

/// The sealing module. `Sealed` is unnameable outside the crate, so no
/// other crate can implement `Handler` on its own types.
mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ──────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

/// Any `Fn(Request) -> impl Future<Output = impl IntoResponse>` is a handler:
/// named `async fn` items, closures returning `async` blocks, or any struct
/// implementing `Fn`.
impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ─────────────────────────────────────────────────────────

/// Bridges a concrete `Fn` handler to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        // Call the wrapped function to get the concrete future, then box it
        // together with the `IntoResponse` conversion.
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
