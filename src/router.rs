use crate::{
	error::RouteError,
	pattern::PathPattern,
	route::{empty, Context, Handler, HandlerResult, Method, Request, Response, StatusCode, DEFAULT_BODY_LIMIT},
	static_files::{StaticDir, StaticOptions},
};
use anyhow::{anyhow, Error};
use futures_util::FutureExt;
use serde::Deserialize;
use std::{
	any::Any,
	fmt::{self, Debug, Formatter},
	panic::{self, AssertUnwindSafe},
	sync::Arc,
};
use tracing::{debug, error, trace};

/// Receives every handler failure caught during dispatch, once per failure.
pub type ErrorReporter = Arc<dyn Fn(&Error) + Send + Sync>;

fn default_error_reporter(e: &Error) {
	error!(error = ?e, "route handler failed");
}

/// What dispatch does after a matched handler fails.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
	/// Remember a 500 and keep searching. A later matching route that succeeds still wins, and a
	/// later route that does not match turns the fallback status back into a 404.
	#[default]
	Continue,
	/// Answer 500 straight away.
	Halt,
}

/// Declarative router setup, usually deserialized from the host's configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
	pub failure_mode: FailureMode,
	/// Largest request body, in bytes, a handler may read.
	pub body_limit: usize,
	pub statics: Vec<StaticOptions>,
}

impl Default for RouterConfig {
	fn default() -> Self {
		Self {
			failure_mode: FailureMode::default(),
			body_limit: DEFAULT_BODY_LIMIT,
			statics: Vec::new(),
		}
	}
}

/// The methods a router can dispatch.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Verb {
	Get,
	Post,
}

impl Verb {
	pub fn from_method(method: &Method) -> Option<Self> {
		match *method {
			Method::GET => Some(Self::Get),
			Method::POST => Some(Self::Post),
			_ => None,
		}
	}
}

struct RouteEntry {
	pattern: PathPattern,
	handler: Arc<dyn Handler>,
}

impl Debug for RouteEntry {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteEntry")
			.field("pattern", &self.pattern.as_str())
			.finish_non_exhaustive()
	}
}

/// One ordered route table per supported method. Order is match-search order.
#[derive(Debug, Default)]
struct MethodRegistry {
	get: Vec<RouteEntry>,
	post: Vec<RouteEntry>,
}

impl MethodRegistry {
	fn table(&self, verb: Verb) -> &[RouteEntry] {
		match verb {
			Verb::Get => &self.get,
			Verb::Post => &self.post,
		}
	}

	fn table_mut(&mut self, verb: Verb) -> &mut Vec<RouteEntry> {
		match verb {
			Verb::Get => &mut self.get,
			Verb::Post => &mut self.post,
		}
	}

	fn insert(&mut self, verb: Verb, pattern: PathPattern, handler: Arc<dyn Handler>) {
		let table = self.table_mut(verb);
		match table.iter_mut().find(|entry| entry.pattern == pattern) {
			Some(entry) => entry.handler = handler,
			None => table.push(RouteEntry { pattern, handler }),
		}
	}
}

/// Dispatches requests to handlers by method and path pattern.
///
/// Routes are tried in registration order and the first pattern that matches answers the request
/// if its handler succeeds. When nothing answers, the response is empty with one of:
///
/// - `405` when the method has no routes,
/// - `404` when the last route tried did not match,
/// - `500` when the last route tried matched but its handler failed.
pub struct Router {
	routes: MethodRegistry,
	failure_mode: FailureMode,
	body_limit: usize,
	error_reporter: ErrorReporter,
}

impl Default for Router {
	fn default() -> Self {
		Self {
			routes: MethodRegistry::default(),
			failure_mode: FailureMode::default(),
			body_limit: DEFAULT_BODY_LIMIT,
			error_reporter: Arc::new(default_error_reporter),
		}
	}
}

impl Debug for Router {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Router")
			.field("routes", &self.routes)
			.field("failure_mode", &self.failure_mode)
			.field("body_limit", &self.body_limit)
			.finish_non_exhaustive()
	}
}

impl Router {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a router and mounts every configured static directory.
	pub fn from_config(config: RouterConfig) -> Result<Self, RouteError> {
		let mut router = Self::new();
		router
			.failure_mode(config.failure_mode)
			.body_limit(config.body_limit);
		for options in config.statics {
			router.serve_static(options)?;
		}
		Ok(router)
	}

	pub fn failure_mode(&mut self, mode: FailureMode) -> &mut Self {
		self.failure_mode = mode;
		self
	}

	/// Caps the request body handlers can read through [`Request::bytes`] on dispatched requests.
	pub fn body_limit(&mut self, limit: usize) -> &mut Self {
		self.body_limit = limit;
		self
	}

	/// Replaces the default reporter, which logs each failure at error level.
	pub fn error_reporter<F>(&mut self, reporter: F) -> &mut Self
	where
		F: Fn(&Error) + Send + Sync + 'static,
	{
		self.error_reporter = Arc::new(reporter);
		self
	}

	/// Binds `handler` to `method` and `pattern`.
	///
	/// Registering the same method and pattern again replaces the handler without moving the
	/// route. Methods other than `GET` and `POST` are accepted but never dispatched.
	pub fn register<H: Handler>(
		&mut self,
		method: Method,
		pattern: &str,
		handler: H,
	) -> Result<&mut Self, RouteError> {
		let pattern = PathPattern::parse(pattern)?;

		match Verb::from_method(&method) {
			Some(verb) => {
				debug!(%method, pattern = pattern.as_str(), "registered route");
				self.routes.insert(verb, pattern, Arc::new(handler));
			}
			None => {
				debug!(%method, pattern = pattern.as_str(), "ignored route for unsupported method");
			}
		}

		Ok(self)
	}

	pub fn get<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
		self.register(Method::GET, pattern, handler)
	}

	pub fn post<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
		self.register(Method::POST, pattern, handler)
	}

	/// Serves files from `options.directory` under `GET {options.pathname}/...`.
	pub fn serve_static(&mut self, options: StaticOptions) -> Result<&mut Self, RouteError> {
		let pattern = options.pattern();
		self.get(&pattern, StaticDir::from_options(&options))
	}

	/// The patterns registered for `method`, in match order.
	pub fn routes(&self, method: &Method) -> Vec<&str> {
		Verb::from_method(method)
			.map(|verb| {
				self.routes
					.table(verb)
					.iter()
					.map(|entry| entry.pattern.as_str())
					.collect()
			})
			.unwrap_or_default()
	}

	/// Dispatches a request. Never fails: handler errors become status codes.
	pub async fn route(&self, request: Request) -> Response {
		let mut status = StatusCode::METHOD_NOT_ALLOWED;

		let verb = match Verb::from_method(request.method()) {
			Some(verb) => verb,
			None => return self.fallback(&request, status),
		};

		let request = Arc::new(request);
		for entry in self.routes.table(verb) {
			let params = match entry.pattern.matches(request.path()) {
				Some(params) => params,
				None => {
					status = StatusCode::NOT_FOUND;
					continue;
				}
			};

			let ctx = Context::new(Arc::clone(&request), params);
			match invoke(entry.handler.as_ref(), ctx).await {
				Ok(res) => {
					trace!(
						method = %request.method(),
						path = request.path(),
						pattern = entry.pattern.as_str(),
						status = res.status().as_u16(),
						"routed"
					);
					return res;
				}
				Err(e) => {
					(self.error_reporter)(&e);
					status = StatusCode::INTERNAL_SERVER_ERROR;
					if self.failure_mode == FailureMode::Halt {
						break;
					}
				}
			}
		}

		self.fallback(&request, status)
	}

	/// Dispatches a hyper request. The body is left unread until a handler asks for it, so a
	/// broken body only fails the handlers that read it.
	pub async fn dispatch(&self, req: hyper::Request<hyper::Body>) -> Response {
		let request = Request::from_hyper(req).with_body_limit(self.body_limit);
		self.route(request).await
	}

	fn fallback(&self, request: &Request, status: StatusCode) -> Response {
		trace!(
			method = %request.method(),
			path = request.path(),
			status = status.as_u16(),
			"no route answered"
		);
		empty(status)
	}
}

/// Runs a handler to completion, turning a panic in either the call or the future into an error.
async fn invoke(handler: &dyn Handler, ctx: Context) -> HandlerResult {
	let fut = panic::catch_unwind(AssertUnwindSafe(|| handler.call(ctx))).map_err(panic_error)?;

	AssertUnwindSafe(fut)
		.catch_unwind()
		.await
		.unwrap_or_else(|payload| Err(panic_error(payload)))
}

fn panic_error(payload: Box<dyn Any + Send>) -> Error {
	let message = payload
		.downcast_ref::<&str>()
		.map(|s| s.to_string())
		.or_else(|| payload.downcast_ref::<String>().cloned())
		.unwrap_or_else(|| "unknown panic payload".to_owned());
	anyhow!("route handler panicked: {}", message)
}
