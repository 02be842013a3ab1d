//! Request executor: classify, throttle, send, and translate the outcome.
//!
//! [`ApiExecutor::execute`] is the pipeline's single entry point. Every call is classified
//! against the quota catalog, admitted through that quota's rate gate, sent through the
//! transport, and either returned as a raw [`ApiResponse`] (2xx) or mapped into an [`Error`]
//! that keeps the response. The permit's cooldown starts once the call finishes, whatever the
//! outcome. Nothing here retries.

// self
use crate::{
	_prelude::*,
	http::{ApiHttpClient, ApiRequest, ApiResponse, StatusCode, TransportErrorMapper},
	limiter::RateLimiter,
	obs::{self, CallSpan},
	quota::QuotaCatalog,
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

/// Default `User-Agent` sent with every call.
pub const DEFAULT_USER_AGENT: &str = concat!("mangadex-core/", env!("CARGO_PKG_VERSION"));
/// Default deadline for establishing a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default deadline for a whole call, body included.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[cfg(feature = "reqwest")]
/// Executor specialized for the crate's default reqwest transport stack.
pub type ReqwestApiExecutor = ApiExecutor<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Executor settings with MangaDex defaults.
#[derive(Clone, Debug)]
pub struct ExecutorConfig {
	/// Quota catalog, including the API base URLs are classified against.
	pub catalog: QuotaCatalog,
	/// `User-Agent` header value.
	pub user_agent: String,
	/// Connection deadline.
	pub connect_timeout: Duration,
	/// Whole-call deadline.
	pub request_timeout: Duration,
}
impl ExecutorConfig {
	/// Replaces the quota catalog.
	pub fn with_catalog(mut self, catalog: QuotaCatalog) -> Self {
		self.catalog = catalog;

		self
	}

	/// Points the catalog at another API base (a mirror or a local mock).
	pub fn with_api_base(mut self, base: &str) -> Self {
		self.catalog = self.catalog.with_base(base);

		self
	}

	/// Overrides the `User-Agent` header.
	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = user_agent.into();

		self
	}

	/// Overrides the connection deadline.
	pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
		self.connect_timeout = timeout;

		self
	}

	/// Overrides the whole-call deadline.
	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;

		self
	}
}
impl Default for ExecutorConfig {
	fn default() -> Self {
		Self {
			catalog: QuotaCatalog::mangadex(),
			user_agent: DEFAULT_USER_AGENT.into(),
			connect_timeout: DEFAULT_CONNECT_TIMEOUT,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
		}
	}
}

/// Rate-limited API executor.
///
/// Clones share the transport, the mapper, and the rate gates, so one executor (or any number
/// of clones) enforces one set of quotas for the whole process.
pub struct ApiExecutor<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound call.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	limiter: Arc<RateLimiter>,
	config: Arc<ExecutorConfig>,
}
impl<C, M> ApiExecutor<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an executor that reuses the caller-provided transport + mapper pair.
	///
	/// The transport is used as-is; `user_agent` and the deadlines in `config` only apply to
	/// transports built by [`ApiExecutor::new`].
	pub fn with_http_client(
		config: ExecutorConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let limiter = Arc::new(RateLimiter::new(&config.catalog));

		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			limiter,
			config: Arc::new(config),
		}
	}

	/// Active configuration.
	pub fn config(&self) -> &ExecutorConfig {
		&self.config
	}

	/// Quota catalog used for classification.
	pub fn catalog(&self) -> &QuotaCatalog {
		&self.config.catalog
	}

	/// Shared rate gates.
	pub fn limiter(&self) -> &RateLimiter {
		&self.limiter
	}

	/// Stops admitting calls; callers waiting for a permit fail with [`Error::Interrupted`].
	pub fn shutdown(&self) {
		self.limiter.shutdown();
	}

	/// Executes one call.
	///
	/// Returns the raw response for 2xx statuses. Everything else becomes an [`Error`]:
	/// transport failures through the configured mapper, statuses through
	/// [`classify_response`]. Malformed requests are rejected before a permit is taken.
	pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
		let quota = self.config.catalog.classify(&request.method, &request.url);
		let span = CallSpan::request(&request.method, quota);
		let result = span
			.instrument(async {
				let http_request = request.into_http()?;
				let _permit = self.limiter.acquire(quota).await?;
				let response = self
					.http_client
					.send(http_request)
					.await
					.map_err(|err| self.transport_mapper.map_transport_error(err))?;

				span.record_status(response.status().as_u16());

				classify_response(response.into())
			})
			.await;

		obs::record_request_outcome(quota, obs::request_outcome_label(&result));

		result
	}
}
#[cfg(feature = "reqwest")]
impl ApiExecutor<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates an executor with its own reqwest transport built from `config`.
	pub fn new(config: ExecutorConfig) -> Result<Self> {
		let client = ReqwestHttpClient::build(
			&config.user_agent,
			config.connect_timeout,
			config.request_timeout,
		)?;

		Ok(Self::with_http_client(config, client, ReqwestTransportErrorMapper))
	}
}
impl<C, M> Clone for ApiExecutor<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			limiter: self.limiter.clone(),
			config: self.config.clone(),
		}
	}
}
impl<C, M> Debug for ApiExecutor<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiExecutor")
			.field("api_base", &self.config.catalog.base())
			.field("user_agent", &self.config.user_agent)
			.field("shut_down", &self.limiter.is_shut_down())
			.finish()
	}
}

/// Maps a received response onto the error taxonomy.
///
/// 2xx is success; 401 is [`Error::Unauthorized`]; 408 is [`Error::Timeout`]; other 4xx and 5xx
/// statuses with a registered reason phrase are [`Error::ClientError`] and
/// [`Error::ServerError`]; anything else (unregistered codes such as 599, informational or
/// redirect statuses that reached the caller) is [`Error::UnexpectedStatus`].
pub fn classify_response(response: ApiResponse) -> Result<ApiResponse> {
	let status = response.status();

	if status.is_success() {
		return Ok(response);
	}

	let registered = status.canonical_reason().is_some();
	let response = Box::new(response);

	Err(match status {
		StatusCode::UNAUTHORIZED => Error::Unauthorized { response },
		StatusCode::REQUEST_TIMEOUT => Error::Timeout { status: Some(status.as_u16()), source: None },
		_ if registered && status.is_client_error() => Error::ClientError { response },
		_ if registered && status.is_server_error() => Error::ServerError { response },
		_ => Error::UnexpectedStatus { response },
	})
}
