use patchbay::{header, Method, Request, Response, Router, StaticOptions, StatusCode};
use std::fs;
use tempfile::TempDir;

fn fixture() -> TempDir {
	let dir = tempfile::tempdir().unwrap();
	fs::write(dir.path().join("hello.txt"), "Hello\n").unwrap();
	fs::create_dir(dir.path().join("js")).unwrap();
	fs::write(dir.path().join("js/app.js"), "console.log(1);").unwrap();
	fs::write(dir.path().join("data.bin"), [0u8, 1, 2, 255]).unwrap();
	dir
}

fn router_for(dir: &TempDir, options: StaticOptions) -> Router {
	let mut router = Router::new();
	router
		.serve_static(StaticOptions {
			directory: dir.path().to_path_buf(),
			..options
		})
		.unwrap();
	router
}

async fn get(router: &Router, uri: &str) -> Response {
	router.route(Request::new(Method::GET, uri.parse().unwrap())).await
}

async fn body_bytes(res: Response) -> Vec<u8> {
	hyper::body::to_bytes(res.into_body()).await.unwrap().to_vec()
}

#[tokio::test]
async fn serves_existing_file() {
	let dir = fixture();
	let router = router_for(&dir, StaticOptions::default());

	let res = get(&router, "/static/hello.txt").await;
	assert_eq!(res.status(), StatusCode::OK);
	assert_eq!(
		res.headers().get(header::CONTENT_TYPE).unwrap(),
		"text/plain; charset=utf-8"
	);
	assert_eq!(res.headers().get(header::CONTENT_LENGTH).unwrap(), "6");
	assert_eq!(body_bytes(res).await, b"Hello\n");
}

#[tokio::test]
async fn javascript_gets_content_type() {
	let dir = fixture();
	let router = router_for(&dir, StaticOptions::default());

	let res = get(&router, "/static/js/app.js").await;
	assert_eq!(res.status(), StatusCode::OK);
	assert_eq!(
		res.headers().get(header::CONTENT_TYPE).unwrap(),
		"text/javascript"
	);
	assert_eq!(body_bytes(res).await, b"console.log(1);");
}

#[tokio::test]
async fn unknown_extension_has_no_content_type() {
	let dir = fixture();
	let router = router_for(&dir, StaticOptions::default());

	let res = get(&router, "/static/data.bin").await;
	assert_eq!(res.status(), StatusCode::OK);
	assert!(res.headers().get(header::CONTENT_TYPE).is_none());
	assert_eq!(body_bytes(res).await, vec![0u8, 1, 2, 255]);
}

#[tokio::test]
async fn fallback_content_type_is_configurable() {
	let dir = fixture();
	let router = router_for(
		&dir,
		StaticOptions {
			default_content_type: Some("application/octet-stream".into()),
			..StaticOptions::default()
		},
	);

	let res = get(&router, "/static/data.bin").await;
	assert_eq!(
		res.headers().get(header::CONTENT_TYPE).unwrap(),
		"application/octet-stream"
	);
}

#[tokio::test]
async fn missing_file_is_not_found() {
	let dir = fixture();
	let router = router_for(&dir, StaticOptions::default());

	for uri in ["/static/nope.txt", "/static/js", "/static"] {
		let res = get(&router, uri).await;
		assert_eq!(res.status(), StatusCode::NOT_FOUND, "{}", uri);
		assert_eq!(body_bytes(res).await, b"Not Found");
	}
}

#[tokio::test]
async fn traversal_is_not_found() {
	let dir = fixture();
	let inner = dir.path().join("public");
	fs::create_dir(&inner).unwrap();

	let mut router = Router::new();
	router
		.serve_static(StaticOptions::new("/static", &inner))
		.unwrap();

	let res = get(&router, "/static/../hello.txt").await;
	assert_eq!(res.status(), StatusCode::NOT_FOUND);
	assert_eq!(body_bytes(res).await, b"Not Found");
}

#[tokio::test]
async fn custom_mount_point() {
	let dir = fixture();
	let router = router_for(&dir, StaticOptions::new("/assets/", "unused"));

	assert_eq!(router.routes(&Method::GET), vec!["/assets/:path*"]);
	let res = get(&router, "/assets/hello.txt").await;
	assert_eq!(res.status(), StatusCode::OK);

	let res = get(&router, "/static/hello.txt").await;
	assert_eq!(res.status(), StatusCode::NOT_FOUND);
	assert_eq!(body_bytes(res).await, b"");
}

#[tokio::test]
async fn post_to_static_is_method_not_allowed() {
	let dir = fixture();
	let router = router_for(&dir, StaticOptions::default());

	let res = router
		.route(Request::new(Method::POST, "/static/hello.txt".parse().unwrap()))
		.await;
	assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}
