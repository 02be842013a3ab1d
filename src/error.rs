//! Pipeline-level error taxonomy shared by the executor, limiter, and session.

// self
use crate::{_prelude::*, http::ApiResponse, quota::QuotaError};

/// Pipeline-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used to keep transport-specific sources opaque.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Status-derived variants keep the raw [`ApiResponse`] so callers can inspect headers and
/// body. Nothing in this crate retries on its own; [`Error::is_retryable`] is advice for the
/// caller's own policy.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Session lifecycle violation.
	#[error(transparent)]
	Session(#[from] SessionError),

	/// Credential missing or rejected (HTTP 401); re-authenticate instead of retrying.
	#[error("Request was rejected as unauthorized (HTTP 401).")]
	Unauthorized {
		/// Raw upstream response.
		response: Box<ApiResponse>,
	},
	/// Connect/read/write deadline exceeded, or the server answered HTTP 408.
	#[error("Request timed out.")]
	Timeout {
		/// HTTP status when the timeout was reported by the server.
		status: Option<u16>,
		/// Transport failure, when the deadline fired locally.
		#[source]
		source: Option<BoxError>,
	},
	/// DNS failure, refused or reset connection, broken body stream.
	#[error("Network failure occurred while sending the request.")]
	Network {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// Request was malformed or addressed a missing resource (4xx other than 401/408).
	#[error("Request was rejected with HTTP {}.", .response.status().as_u16())]
	ClientError {
		/// Raw upstream response.
		response: Box<ApiResponse>,
	},
	/// Upstream fault (5xx).
	#[error("Upstream failed with HTTP {}.", .response.status().as_u16())]
	ServerError {
		/// Raw upstream response.
		response: Box<ApiResponse>,
	},
	/// Any other non-success status.
	#[error("Upstream returned unexpected HTTP {}.", .response.status().as_u16())]
	UnexpectedStatus {
		/// Raw upstream response.
		response: Box<ApiResponse>,
	},
	/// The rate gate shut down while the caller was waiting for a permit.
	#[error("Interrupted while waiting for the `{quota}` rate gate.")]
	Interrupted {
		/// Quota the caller was waiting on.
		quota: String,
	},
	/// Transport failure that fits no other category.
	#[error("Unclassified transport failure.")]
	Unclassified {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// Token endpoint answered with JSON that does not describe a token pair.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status of the token response.
		status: u16,
	},
}
impl Error {
	/// Wraps a transport timeout.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { status: None, source: Some(Box::new(src)) }
	}

	/// Wraps a transport network failure.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport failure that fits no other category.
	pub fn unclassified(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Unclassified { source: Box::new(src) }
	}

	/// Returns the raw response for status-derived errors.
	pub fn response(&self) -> Option<&ApiResponse> {
		match self {
			Self::Unauthorized { response }
			| Self::ClientError { response }
			| Self::ServerError { response }
			| Self::UnexpectedStatus { response } => Some(response),
			_ => None,
		}
	}

	/// Returns the HTTP status associated with the failure, when one exists.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Timeout { status, .. } => *status,
			Self::TokenResponse { status, .. } => Some(*status),
			_ => self.response().map(|response| response.status().as_u16()),
		}
	}

	/// Returns the upstream `Retry-After` hint, when the response carried one.
	pub fn retry_after(&self) -> Option<Duration> {
		self.response().and_then(ApiResponse::retry_after)
	}

	/// Whether retrying the same request later may succeed.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Timeout { .. } | Self::Network { .. } | Self::ServerError { .. } => true,
			Self::ClientError { response } => response.status().as_u16() == 429,
			_ => false,
		}
	}

	/// Stable label for span and metric fields.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Config(_) => "config",
			Self::Session(_) => "session",
			Self::Unauthorized { .. } => "unauthorized",
			Self::Timeout { .. } => "timeout",
			Self::Network { .. } => "network",
			Self::ClientError { .. } => "client_error",
			Self::ServerError { .. } => "server_error",
			Self::UnexpectedStatus { .. } => "unexpected_status",
			Self::Interrupted { .. } => "interrupted",
			Self::Unclassified { .. } => "unclassified",
			Self::TokenResponse { .. } => "token_response",
		}
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A header value contains bytes HTTP does not allow.
	#[error("Header value is invalid.")]
	InvalidHeader(#[from] oauth2::http::header::InvalidHeaderValue),
	/// A configured URL cannot be parsed.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending input.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Quota catalog failed validation.
	#[error(transparent)]
	InvalidQuota(#[from] QuotaError),
	/// Token endpoint response omitted the refresh token on login.
	#[error("Token endpoint response is missing a refresh token.")]
	MissingRefreshToken,
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	BodyEncode(#[from] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Session lifecycle failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum SessionError {
	/// No credential has been stored yet.
	#[error("Session is not authenticated.")]
	NotAuthenticated,
	/// The session was closed; its credential is gone.
	#[error("Session has been closed.")]
	Closed,
}
