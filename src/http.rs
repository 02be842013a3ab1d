//! Transport primitives for API calls.
//!
//! [`ApiHttpClient`] is the pipeline's only dependency on an HTTP stack: it takes a fully built
//! [`HttpRequest`] and resolves to an [`HttpResponse`] or a transport-specific error. A paired
//! [`TransportErrorMapper`] translates that error into the crate taxonomy (timeout, network,
//! unclassified) so the executor never leaks raw transport failures. The reqwest-backed pair
//! ships behind the default `reqwest` feature.

mod request;
mod response;

pub use oauth2::{
	HttpRequest, HttpResponse,
	http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header},
};
pub use request::*;
pub use response::*;

// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Boxed future returned by [`ApiHttpClient::send`].
pub type TransportFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing API calls.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by every
/// executor clone and session, and the returned future must be `Send` so calls can hop between
/// runtime workers. Implementations must not retry; retry policy belongs to callers.
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends `request` and buffers the whole response body.
	fn send(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError>;
}

/// Maps transport failures into pipeline [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an error emitted by the transport into a pipeline error.
	fn map_transport_error(&self, error: E) -> Error;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client with the provided user agent and deadlines.
	pub fn build(
		user_agent: &str,
		connect_timeout: Duration,
		request_timeout: Duration,
	) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.user_agent(user_agent)
			.connect_timeout(connect_timeout)
			.timeout(request_timeout)
			.build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn send(&self, request: HttpRequest) -> TransportFuture<'_, ReqwestError> {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client.execute(request.try_into()?).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(response.bytes().await?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, err: ReqwestError) -> Error {
		if err.is_builder() {
			return ConfigError::from(err).into();
		}
		// Checked first: reqwest reports a read deadline as a body or request error too.
		if err.is_timeout() {
			return Error::timeout(err);
		}
		if err.is_connect() || err.is_request() || err.is_body() || has_io_source(&err) {
			return Error::network(err);
		}

		Error::unclassified(err)
	}
}

#[cfg(feature = "reqwest")]
fn has_io_source(err: &(dyn StdError + 'static)) -> bool {
	let mut source = err.source();

	while let Some(inner) = source {
		if inner.is::<std::io::Error>() {
			return true;
		}

		source = inner.source();
	}

	false
}
