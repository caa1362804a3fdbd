//! File extension to media type lookup for static files.

use std::{collections::HashMap, path::Path};

const DEFAULT_TYPES: &[(&str, &str)] = &[
	// Text
	("html", "text/html; charset=utf-8"),
	("htm", "text/html; charset=utf-8"),
	("css", "text/css"),
	("txt", "text/plain; charset=utf-8"),
	("xml", "application/xml"),
	// JavaScript/WASM
	("js", "text/javascript"),
	("mjs", "text/javascript"),
	("json", "application/json"),
	("wasm", "application/wasm"),
	// Images
	("png", "image/png"),
	("jpg", "image/jpeg"),
	("jpeg", "image/jpeg"),
	("gif", "image/gif"),
	("svg", "image/svg+xml"),
	("ico", "image/x-icon"),
	("webp", "image/webp"),
	// Fonts
	("woff", "font/woff"),
	("woff2", "font/woff2"),
];

/// An extensible mapping from file extension to `content-type` value.
///
/// Unknown extensions resolve to the fallback, which is unset by default so that no header is
/// sent for them.
#[derive(Debug, Clone)]
pub struct ContentTypes {
	types: HashMap<String, String>,
	fallback: Option<String>,
}

impl Default for ContentTypes {
	fn default() -> Self {
		Self {
			types: DEFAULT_TYPES
				.iter()
				.map(|(ext, ty)| (ext.to_string(), ty.to_string()))
				.collect(),
			fallback: None,
		}
	}
}

impl ContentTypes {
	/// A table with no entries and no fallback.
	pub fn empty() -> Self {
		Self {
			types: HashMap::new(),
			fallback: None,
		}
	}

	/// Adds or replaces the type for `extension` (without the leading dot).
	pub fn insert(&mut self, extension: &str, media_type: impl Into<String>) -> &mut Self {
		self.types
			.insert(extension.to_ascii_lowercase(), media_type.into());
		self
	}

	pub fn set_fallback(&mut self, media_type: Option<String>) -> &mut Self {
		self.fallback = media_type;
		self
	}

	/// Extensions are compared case-insensitively.
	pub fn lookup(&self, path: &Path) -> Option<&str> {
		path.extension()
			.and_then(|ext| ext.to_str())
			.and_then(|ext| self.types.get(&ext.to_ascii_lowercase()))
			.or(self.fallback.as_ref())
			.map(String::as_str)
	}
}
