use crate::{
	mime::ContentTypes,
	route::{header, Body, Context, Handler, HandlerFuture, HandlerResult, Response, ResponseBuilder, StatusCode},
};
use futures_util::{stream, Stream};
use hyper::body::Bytes;
use serde::Deserialize;
use std::{
	collections::HashMap,
	io,
	path::{Component, Path, PathBuf},
	sync::Arc,
};
use tokio::{fs::File, io::AsyncReadExt};
use tracing::debug;

const CHUNK_SIZE: usize = 16 * 1024;

/// Where and how a directory of files is mounted on a router.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticOptions {
	/// URL prefix; files are served under `{pathname}/...`.
	pub pathname: String,
	/// Directory the captured path is resolved against.
	pub directory: PathBuf,
	/// Extra extension to media type entries on top of the built-in table.
	pub content_types: HashMap<String, String>,
	/// Sent for unrecognised extensions. No header when unset.
	pub default_content_type: Option<String>,
}

impl Default for StaticOptions {
	fn default() -> Self {
		Self {
			pathname: "/static".into(),
			directory: "static".into(),
			content_types: HashMap::new(),
			default_content_type: None,
		}
	}
}

impl StaticOptions {
	pub fn new(pathname: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
		Self {
			pathname: pathname.into(),
			directory: directory.into(),
			..Self::default()
		}
	}

	/// The trailing-capture pattern the handler is registered under.
	pub fn pattern(&self) -> String {
		format!("{}/:path*", self.pathname.trim_end_matches('/'))
	}

	fn content_types(&self) -> ContentTypes {
		let mut types = ContentTypes::default();
		for (ext, ty) in &self.content_types {
			types.insert(ext, ty.clone());
		}
		types.set_fallback(self.default_content_type.clone());
		types
	}
}

/// Serves files below a root directory, answering 404 for anything it cannot open.
#[derive(Debug, Clone)]
pub struct StaticDir {
	root: Arc<Path>,
	types: Arc<ContentTypes>,
}

impl StaticDir {
	pub fn new(root: impl Into<PathBuf>, types: ContentTypes) -> Self {
		Self {
			root: Arc::from(root.into()),
			types: Arc::new(types),
		}
	}

	pub fn from_options(options: &StaticOptions) -> Self {
		Self::new(options.directory.clone(), options.content_types())
	}

	/// Maps a captured URL path onto the root. Anything other than plain names (`..`, a root, a
	/// drive prefix) yields `None`.
	fn resolve(&self, captured: &str) -> Option<PathBuf> {
		let mut path = self.root.to_path_buf();
		for component in Path::new(captured).components() {
			match component {
				Component::Normal(part) => path.push(part),
				Component::CurDir => {}
				_ => return None,
			}
		}
		Some(path)
	}

	async fn serve(&self, captured: Option<&str>) -> HandlerResult {
		let captured = captured.unwrap_or_default();
		let Some(path) = self.resolve(captured) else {
			debug!(path = captured, "rejected static path outside of root");
			return Ok(not_found());
		};

		let (file, len) = match open_regular_file(&path).await {
			Ok(opened) => opened,
			Err(err) => {
				debug!(path = %path.display(), error = %err, "static file unavailable");
				return Ok(not_found());
			}
		};

		let mut builder = ResponseBuilder::new()
			.status(StatusCode::OK)
			.header(header::CONTENT_LENGTH, len);
		if let Some(media_type) = self.types.lookup(&path) {
			builder = builder.header(header::CONTENT_TYPE, media_type);
		}

		Ok(builder.body(Body::wrap_stream(read_chunks(file)))?)
	}
}

impl Handler for StaticDir {
	fn call(&self, ctx: Context) -> HandlerFuture {
		let dir = self.clone();
		Box::pin(async move { dir.serve(ctx.param("path")).await })
	}
}

pub fn not_found() -> Response {
	let mut res = Response::new(Body::from("Not Found"));
	*res.status_mut() = StatusCode::NOT_FOUND;
	res
}

async fn open_regular_file(path: &Path) -> io::Result<(File, u64)> {
	let file = File::open(path).await?;
	let metadata = file.metadata().await?;
	if !metadata.is_file() {
		return Err(io::Error::new(io::ErrorKind::NotFound, "not a regular file"));
	}
	Ok((file, metadata.len()))
}

fn read_chunks(file: File) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
	stream::try_unfold(file, next_chunk)
}

async fn next_chunk(mut file: File) -> io::Result<Option<(Bytes, File)>> {
	let mut buf = vec![0; CHUNK_SIZE];
	let n = file.read(&mut buf).await?;
	if n == 0 {
		return Ok(None);
	}
	buf.truncate(n);
	Ok(Some((Bytes::from(buf), file)))
}
