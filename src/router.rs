//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup. Middleware registered
//! with [`Router::layer`] wraps whatever the lookup produces, including the
//! `404 Not Found` fallback.
//!
//! Layers are applied while the router is being built, not per request: the
//! trees store handlers that already sit behind every layer, so a lookup
//! costs one `Arc` clone no matter how many layers are registered.

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{Layered, Middleware};
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each builder call returns `self` so registrations chain naturally.
pub struct Router {
    /// Lookup trees holding the layered handlers.
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    /// Unlayered registrations, kept to rebuild the trees when a layer is added.
    registered: Vec<(Method, String, BoxedHandler)>,
    middleware: Vec<Arc<dyn Middleware>>,
    fallback: BoxedHandler,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            registered: Vec::new(),
            middleware: Vec::new(),
            fallback: not_found.into_boxed_handler(),
        }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax — `req.param("name")` retrieves them:
    ///
    /// ```rust,no_run
    /// # use http::Method;
    /// # use tsu_accesslog::{Request, Response, Router};
    /// # async fn get_user(_: Request) -> Response { Response::text("") }
    /// # async fn create_user(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::GET,  "/users/{id}", get_user)
    ///     .on(Method::POST, "/users",      create_user);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        let handler = handler.into_boxed_handler();
        self.insert(method.clone(), path, Arc::clone(&handler));
        self.registered.push((method, path.to_owned(), handler));
        self
    }

    /// Wraps every request in `middleware`. The first layer added is the
    /// outermost one: it sees the request first and the response last.
    ///
    /// Routes registered before and after this call are both wrapped.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Arc::new(middleware));

        // Re-wrap from the raw handlers so the new layer lands innermost.
        self.routes.clear();
        for (method, path, handler) in std::mem::take(&mut self.registered) {
            self.insert(method.clone(), &path, Arc::clone(&handler));
            self.registered.push((method, path, handler));
        }
        self.fallback = self.wrap(not_found.into_boxed_handler());
        self
    }

    /// Resolves a request to its layered handler plus the matched path
    /// parameters. Unknown routes resolve to the layered 404 fallback.
    pub(crate) fn route(
        &self,
        method: &Method,
        path: &str,
    ) -> (BoxedHandler, HashMap<String, String>) {
        self.lookup(method, path)
            .unwrap_or_else(|| (Arc::clone(&self.fallback), HashMap::new()))
    }

    fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    fn insert(&mut self, method: Method, path: &str, handler: BoxedHandler) {
        let handler = self.wrap(handler);
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
    }

    fn wrap(&self, handler: BoxedHandler) -> BoxedHandler {
        self.middleware.iter().rev().fold(handler, |next, middleware| {
            let layered: BoxedHandler = Arc::new(Layered { middleware: Arc::clone(middleware), next });
            layered
        })
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

async fn not_found(_req: Request) -> Response {
    Response::status(StatusCode::NOT_FOUND)
}
