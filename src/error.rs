use thiserror::Error;

/// Errors raised while registering routes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
	/// The path pattern is empty or malformed.
	#[error("invalid argument: {0}")]
	InvalidArgument(String),
}

impl RouteError {
	pub(crate) fn invalid(msg: impl Into<String>) -> Self {
		Self::InvalidArgument(msg.into())
	}
}
