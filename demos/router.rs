use patchbay::{
	hyper::Server, Body, Context, HandlerResult, HttpRouter, Response, ResponseBuilder, Router, RouterConfig,
};
use serde::Deserialize;
use std::{env, fs, net::SocketAddr};
use tracing::info;
use tracing_subscriber::EnvFilter;

async fn index(_ctx: Context) -> HandlerResult {
	Ok(Response::new(Body::from("patchbay demo\n")))
}

async fn item(ctx: Context) -> HandlerResult {
	let id = ctx.param("id").unwrap_or_default();
	Ok(ResponseBuilder::default().body(Body::from(format!("item {}\n", id)))?)
}

#[derive(Deserialize)]
struct Echo {
	x: String,
}

async fn echo(ctx: Context) -> HandlerResult {
	let payload: Echo = ctx.request().json().await?;
	Ok(Response::new(Body::from(payload.x)))
}

fn load_config() -> Result<RouterConfig, Box<dyn std::error::Error + Send + Sync>> {
	match env::var("PATCHBAY_CONFIG") {
		Ok(path) => Ok(toml::from_str(&fs::read_to_string(path)?)?),
		Err(_) => Ok(RouterConfig {
			statics: vec![Default::default()],
			..Default::default()
		}),
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.init();

	let addr: SocketAddr = env::var("PATCHBAY_ADDR")
		.unwrap_or_else(|_| "127.0.0.1:3000".to_owned())
		.parse()?;

	let mut router = Router::from_config(load_config()?)?;
	router
		.get("/", index)?
		.get("/items/:id", item)?
		.post("/echo", echo)?;

	let server = Server::bind(&addr).serve(HttpRouter::from(router));
	info!("Listening on http://{}", addr);

	server.await?;
	Ok(())
}
