use crate::error::RouteError;
use std::{
	fmt::{self, Display, Formatter},
	str::FromStr,
};

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum PathSegment {
	/// Must equal the path segment exactly.
	Static(String),
	/// `:name`, binds one non-empty segment.
	Dynamic(String),
	/// `:name*`, binds the remaining segments. Always last.
	Rest(String),
}

/// A compiled path pattern such as `/users/:id` or `/static/:path*`.
///
/// Patterns are split on `/` and compared segment by segment against the raw request path. A
/// segment starting with `:` is a capture; anything else is literal text, including a lone `*`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct PathPattern {
	source: String,
	segments: Vec<PathSegment>,
}

impl PathPattern {
	pub fn parse(pattern: &str) -> Result<Self, RouteError> {
		if pattern.is_empty() {
			return Err(RouteError::invalid("pathname must be a non-empty string"));
		}

		let raw: Vec<&str> = pattern.split('/').collect();
		let mut segments = Vec::with_capacity(raw.len());
		let mut names: Vec<&str> = Vec::new();

		for (i, part) in raw.iter().enumerate() {
			let Some(capture) = part.strip_prefix(':') else {
				if part.contains(':') {
					return Err(RouteError::invalid(format!(
						"capture must span a whole segment: {:?} in pattern {:?}",
						part, pattern
					)));
				}
				segments.push(PathSegment::Static((*part).to_owned()));
				continue;
			};

			let (name, rest) = match capture.strip_suffix('*') {
				Some(name) => (name, true),
				None => (capture, false),
			};

			if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
				return Err(RouteError::invalid(format!(
					"invalid capture name {:?} in pattern {:?}",
					name, pattern
				)));
			}
			if names.contains(&name) {
				return Err(RouteError::invalid(format!(
					"duplicate capture {:?} in pattern {:?}",
					name, pattern
				)));
			}
			if rest && i + 1 != raw.len() {
				return Err(RouteError::invalid(format!(
					"capture {:?} must be the last segment of {:?}",
					name, pattern
				)));
			}

			names.push(name);
			segments.push(if rest {
				PathSegment::Rest(name.to_owned())
			} else {
				PathSegment::Dynamic(name.to_owned())
			});
		}

		Ok(Self {
			source: pattern.to_owned(),
			segments,
		})
	}

	pub fn as_str(&self) -> &str {
		&self.source
	}

	pub fn segments(&self) -> &[PathSegment] {
		&self.segments
	}

	/// Tests `path` against this pattern, returning the captures on a match.
	pub fn matches(&self, path: &str) -> Option<Params> {
		let mut params = Params::default();
		let mut parts = path.split('/');

		for segment in &self.segments {
			match segment {
				PathSegment::Static(literal) => {
					if parts.next()? != literal.as_str() {
						return None;
					}
				}
				PathSegment::Dynamic(name) => {
					let value = parts.next().filter(|part| !part.is_empty())?;
					params.push(name, value);
				}
				PathSegment::Rest(name) => {
					let rest: Vec<&str> = parts.by_ref().collect();
					if rest.iter().any(|part| part.is_empty()) {
						return None;
					}
					if !rest.is_empty() {
						params.push(name, &rest.join("/"));
					}
					return Some(params);
				}
			}
		}

		match parts.next() {
			None => Some(params),
			Some(_) => None,
		}
	}
}

impl FromStr for PathPattern {
	type Err = RouteError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl Display for PathPattern {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(&self.source)
	}
}

/// Values captured by a matched [`PathPattern`], in pattern order.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Params(Vec<(String, String)>);

impl Params {
	fn push(&mut self, name: &str, value: &str) {
		self.0.push((name.to_owned(), value.to_owned()));
	}

	pub fn get(&self, name: &str) -> Option<&str> {
		self.0
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.as_str())
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
