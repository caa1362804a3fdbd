use crate::pattern::Params;
use anyhow::{anyhow, bail, Context as _, Result};
use hyper::body::{Bytes, HttpBody};
pub use hyper::{
	http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
	Body,
};
use serde::de::DeserializeOwned;
use std::{future::Future, pin::Pin, sync::Arc};
use tokio::sync::{Mutex, OnceCell};

pub use hyper::http::response::Builder as ResponseBuilder;

/// The response type produced by handlers and by the router.
pub type Response = hyper::Response<Body>;

/// What a handler settles to: a response, or the failure that turns into a 500.
pub type HandlerResult = Result<Response>;

pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// Bodies larger than this are refused unless the router is configured otherwise.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// An inbound request.
///
/// The body is read on first use and cached, so a handler that never looks at it never pays for
/// it, and every handler tried during one dispatch sees the same bytes.
#[derive(Debug)]
pub struct Request {
	method: Method,
	uri: Uri,
	headers: HeaderMap,
	pending: Mutex<Option<Body>>,
	body: OnceCell<Bytes>,
	body_limit: usize,
}

impl Request {
	pub fn new(method: Method, uri: Uri) -> Self {
		Self {
			method,
			uri,
			headers: HeaderMap::new(),
			pending: Mutex::new(None),
			body: OnceCell::new_with(Some(Bytes::new())),
			body_limit: DEFAULT_BODY_LIMIT,
		}
	}

	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.pending = Mutex::new(None);
		self.body = OnceCell::new_with(Some(body.into()));
		self
	}

	pub fn with_header(mut self, name: header::HeaderName, value: HeaderValue) -> Self {
		self.headers.append(name, value);
		self
	}

	pub fn with_body_limit(mut self, limit: usize) -> Self {
		self.body_limit = limit;
		self
	}

	/// Wraps a hyper request without reading its body.
	pub fn from_hyper(req: hyper::Request<Body>) -> Self {
		let (parts, body) = req.into_parts();
		Self {
			method: parts.method,
			uri: parts.uri,
			headers: parts.headers,
			pending: Mutex::new(Some(body)),
			body: OnceCell::new(),
			body_limit: DEFAULT_BODY_LIMIT,
		}
	}

	pub fn method(&self) -> &Method {
		&self.method
	}

	pub fn uri(&self) -> &Uri {
		&self.uri
	}

	/// The raw path of the request URI, without the query.
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|v| v.to_str().ok())
	}

	/// The whole body, read at most once and capped at the body limit.
	///
	/// A body that fails to arrive stays failed: later calls report it as consumed.
	pub async fn bytes(&self) -> Result<&Bytes> {
		self.body
			.get_or_try_init(|| async {
				let body = self
					.pending
					.lock()
					.await
					.take()
					.ok_or_else(|| anyhow!("request body was already consumed"))?;
				self.read_limited(body).await
			})
			.await
	}

	pub async fn text(&self) -> Result<&str> {
		std::str::from_utf8(self.bytes().await?).context("request body is not valid UTF-8")
	}

	pub async fn json<T: DeserializeOwned>(&self) -> Result<T> {
		serde_json::from_slice(self.bytes().await?).context("request body is not valid JSON")
	}

	async fn read_limited(&self, mut body: Body) -> Result<Bytes> {
		if let Some(len) = self
			.header(header::CONTENT_LENGTH.as_str())
			.and_then(|v| v.parse::<usize>().ok())
		{
			if len > self.body_limit {
				bail!("request body of {} bytes exceeds limit of {}", len, self.body_limit);
			}
		}

		let mut buf = Vec::new();
		while let Some(chunk) = body.data().await {
			let chunk = chunk.context("failed to read request body")?;
			if buf.len() + chunk.len() > self.body_limit {
				bail!("request body exceeds limit of {} bytes", self.body_limit);
			}
			buf.extend_from_slice(&chunk);
		}
		Ok(Bytes::from(buf))
	}
}

/// What a handler receives: the request and the values its pattern captured.
#[derive(Debug, Clone)]
pub struct Context {
	request: Arc<Request>,
	params: Params,
}

impl Context {
	pub fn new(request: Arc<Request>, params: Params) -> Self {
		Self { request, params }
	}

	pub fn request(&self) -> &Request {
		&self.request
	}

	pub fn params(&self) -> &Params {
		&self.params
	}

	pub fn param(&self, name: &str) -> Option<&str> {
		self.params.get(name)
	}
}

/// A route handler.
///
/// Implemented for every `Fn(Context) -> impl Future<Output = HandlerResult>` that can be shared
/// across threads, so plain `async fn`s and closures can be registered directly.
pub trait Handler: Send + Sync + 'static {
	fn call(&self, ctx: Context) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
	F: Fn(Context) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = HandlerResult> + Send + 'static,
{
	fn call(&self, ctx: Context) -> HandlerFuture {
		Box::pin(self(ctx))
	}
}

/// Builds a response with the given status and no body.
pub fn empty(status: StatusCode) -> Response {
	let mut res = Response::new(Body::empty());
	*res.status_mut() = status;
	res
}
