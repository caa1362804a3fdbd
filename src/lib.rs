//! A small ordered-pattern HTTP router built on hyper.
//!
//! ```
//! use patchbay::{Body, Context, HandlerResult, Method, Request, Response, Router, StaticOptions};
//!
//! async fn item(ctx: Context) -> HandlerResult {
//! 	let id = ctx.param("id").unwrap_or_default().to_owned();
//! 	Ok(Response::new(Body::from(id)))
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let mut router = Router::new();
//! router
//! 	.get("/items/:id", item)?
//! 	.serve_static(StaticOptions::default())?;
//!
//! let res = router.route(Request::new(Method::GET, "/items/42".parse()?)).await;
//! assert_eq!(res.status(), 200);
//! # Ok(())
//! # }
//! ```
//!
//! Patterns are made of literal segments, `:name` captures that bind one segment, and a trailing
//! `:name*` capture that binds the rest of the path. Routes are tried in the order they were
//! registered, per method. Only `GET` and `POST` are dispatched.
//!
//! Dispatch never fails. A request nobody answers gets an empty `405` (no routes for the method),
//! `404` (no pattern matched) or `500` (a matching handler returned an error or panicked). Handler
//! failures are passed to the router's error reporter, which logs them through `tracing` unless
//! replaced.
//!
//! Wrap a router in [`HttpRouter`] to hand it to `hyper::Server::serve`.

mod error;
mod http;

/// Path patterns and the parameters they capture.
pub mod pattern;

/// Requests, handler contexts and the handler trait.
pub mod route;

/// The router itself: registration, configuration and dispatch.
pub mod router;

/// Media types for static files.
pub mod mime;

/// Serving a directory of files.
pub mod static_files;

pub use error::RouteError;
pub use http::*;
pub use mime::ContentTypes;
pub use pattern::{Params, PathPattern};
pub use route::*;
pub use router::*;
pub use static_files::{StaticDir, StaticOptions};
