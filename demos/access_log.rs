//! Access-logged JSON endpoints.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example access_log
//!   ACCESS_LOG_FORMAT=common cargo run --example access_log
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/users -d '{"name":"alice"}'
//!   curl -H 'Referer: http://example.com/' http://alice@localhost:3000/missing
//!
//! Access lines go to stdout, server events to stderr.

use http::{Method, StatusCode};
use tsu_accesslog::middleware::{Format, Logger};
use tsu_accesslog::{Error, Request, Response, Router, Server};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let format: Format = match std::env::var("ACCESS_LOG_FORMAT") {
        Ok(name) => name.parse()?,
        Err(_) => Format::default(),
    };

    let app = Router::new()
        .on(Method::GET,    "/users/{id}", get_user)
        .on(Method::POST,   "/users",      create_user)
        .on(Method::DELETE, "/users/{id}", delete_user)
        .layer(Logger::new(format, std::io::stdout()));

    Server::bind("0.0.0.0:3000").serve(app).await
}

// GET /users/{id}
async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#).into_bytes())
}

// POST /users
async fn create_user(req: Request) -> Response {
    if req.body().is_empty() {
        return Response::status(StatusCode::BAD_REQUEST);
    }

    Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/users/99")
        .json(br#"{"id":"99","name":"new_user"}"#.to_vec())
}

// DELETE /users/{id} → 204 No Content
async fn delete_user(_req: Request) -> StatusCode {
    StatusCode::NO_CONTENT
}
