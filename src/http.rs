use crate::{route::Response, Router};
use hyper::{body::Body, service::Service};
use std::{
	convert::Infallible,
	future::{ready, Future, Ready},
	pin::Pin,
	sync::Arc,
	task::{Context, Poll},
};

pub use hyper;

/// Hands a shared [`Router`] to every connection accepted by a hyper server.
///
/// ```no_run
/// use patchbay::{HttpRouter, Router, StaticOptions};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
/// let mut router = Router::new();
/// router.serve_static(StaticOptions::default())?;
///
/// let addr = ([127, 0, 0, 1], 3000).into();
/// hyper::Server::bind(&addr).serve(HttpRouter::from(router)).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpRouter {
	router: Arc<Router>,
}

impl From<Router> for HttpRouter {
	fn from(router: Router) -> Self {
		Self {
			router: Arc::new(router),
		}
	}
}

impl HttpRouter {
	pub fn router(&self) -> &Router {
		&self.router
	}
}

impl<T> Service<T> for HttpRouter {
	type Response = RouteService;
	type Error = Infallible;
	type Future = Ready<Result<Self::Response, Self::Error>>;

	fn poll_ready(&mut self, _: &mut Context) -> Poll<Result<(), Self::Error>> {
		Poll::Ready(Ok(()))
	}

	fn call(&mut self, _: T) -> Self::Future {
		ready(Ok(RouteService {
			router: Arc::clone(&self.router),
		}))
	}
}

/// Responsible for handling the actual HTTP requests from hyper.
#[derive(Debug, Clone)]
pub struct RouteService {
	router: Arc<Router>,
}

impl Service<hyper::Request<Body>> for RouteService {
	type Response = Response;
	type Error = Infallible;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

	fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		Poll::Ready(Ok(()))
	}

	fn call(&mut self, req: hyper::Request<Body>) -> Self::Future {
		let router = Arc::clone(&self.router);
		Box::pin(async move { Ok(router.dispatch(req).await) })
	}
}

#[cfg(test)]
mod test {
	use super::{HttpRouter, RouteService};
	use crate::{
		route::{Context, HandlerResult, Response, StatusCode},
		Router, StaticOptions,
	};
	use futures_util::stream;
	use hyper::{service::Service, Body, Method, Request};
	use std::{
		fs, io,
		sync::{
			atomic::{AtomicUsize, Ordering},
			Arc,
		},
	};

	async fn length(ctx: Context) -> HandlerResult {
		let len = ctx.request().bytes().await?.len().to_string();
		Ok(Response::new(Body::from(len)))
	}

	async fn hello(_ctx: Context) -> HandlerResult {
		Ok(Response::new(Body::from("hello")))
	}

	fn broken_body() -> Body {
		Body::wrap_stream(stream::once(async {
			Err::<Vec<u8>, _>(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
		}))
	}

	fn counting_router() -> (Router, Arc<AtomicUsize>) {
		let count = Arc::new(AtomicUsize::new(0));
		let seen = Arc::clone(&count);
		let mut router = Router::new();
		router.error_reporter(move |_| {
			seen.fetch_add(1, Ordering::SeqCst);
		});
		(router, count)
	}

	async fn service(router: Router) -> RouteService {
		HttpRouter::from(router).call(()).await.unwrap()
	}

	fn broken(method: Method, uri: &str) -> Request<Body> {
		Request::builder()
			.method(method)
			.uri(uri)
			.body(broken_body())
			.unwrap()
	}

	#[tokio::test]
	async fn serves_through_hyper_services() {
		let mut router = Router::new();
		router.post("/len", length).unwrap();

		let make = HttpRouter::from(router);
		assert_eq!(make.router().routes(&Method::POST), vec!["/len"]);

		let mut svc = make.clone().call(()).await.unwrap();
		let req = Request::builder()
			.method(Method::POST)
			.uri("/len")
			.body(Body::from("abcd"))
			.unwrap();
		let res = svc.call(req).await.unwrap();
		assert_eq!(res.status(), StatusCode::OK);

		let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
		assert_eq!(&body[..], b"4");
	}

	#[tokio::test]
	async fn unreadable_body_keeps_method_and_path_statuses() {
		let (mut router, count) = counting_router();
		router.post("/len", length).unwrap().get("/hello", hello).unwrap();
		let mut svc = service(router).await;

		let res = svc.call(broken(Method::PUT, "/len")).await.unwrap();
		assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

		let res = svc.call(broken(Method::GET, "/missing")).await.unwrap();
		assert_eq!(res.status(), StatusCode::NOT_FOUND);

		let res = svc.call(broken(Method::GET, "/hello")).await.unwrap();
		assert_eq!(res.status(), StatusCode::OK);

		assert_eq!(count.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn unreadable_body_does_not_block_static_files() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("a.txt"), "file").unwrap();

		let mut router = Router::new();
		router
			.serve_static(StaticOptions::new("/static", dir.path()))
			.unwrap();
		let mut svc = service(router).await;

		let res = svc.call(broken(Method::GET, "/static/a.txt")).await.unwrap();
		assert_eq!(res.status(), StatusCode::OK);
		let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
		assert_eq!(&body[..], b"file");
	}

	#[tokio::test]
	async fn handler_reading_unreadable_body_fails() {
		let (mut router, count) = counting_router();
		router.post("/len", length).unwrap();
		let mut svc = service(router).await;

		let res = svc.call(broken(Method::POST, "/len")).await.unwrap();
		assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(count.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn oversized_body_fails_the_reading_handler() {
		let (mut router, count) = counting_router();
		router.body_limit(3).post("/len", length).unwrap();
		let mut svc = service(router).await;

		let req = Request::post("/len").body(Body::from("abcd")).unwrap();
		let res = svc.call(req).await.unwrap();
		assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(count.load(Ordering::SeqCst), 1);

		let req = Request::post("/len").body(Body::from("abc")).unwrap();
		let res = svc.call(req).await.unwrap();
		assert_eq!(res.status(), StatusCode::OK);
	}
}
