//! Authenticated session: one credential, a background refresh timer, and on-demand refresh.
//!
//! A [`Session`] owns a [`CredentialStore`] and keeps it fresh by exchanging the refresh token
//! at the token endpoint every [`SessionConfig::refresh_interval`]. Callers can also refresh
//! on demand with [`Session::refresh_now`]. Refreshes are single-flighted: a caller that waited
//! while another refresh rotated the pair gets the rotated pair back instead of spending a
//! refresh token the server already invalidated. Each rotation lands through a
//! compare-and-swap on the refresh token it consumed.
//!
//! Lifecycle: `Unauthenticated -> Authenticated -> [Refreshing -> Authenticated]* -> Closed`.
//! After [`Session::close`] every call fails with [`SessionError::Closed`].

mod config;
mod metrics;
mod timer;

pub use config::*;
pub use metrics::RefreshMetrics;
pub use timer::CloseOutcome;

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{
	_prelude::*,
	auth::{
		CompareAndSwapOutcome, CredentialStatus, CredentialStore, TokenPair, TokenSecret,
		Username, grant,
	},
	error::{ConfigError, SessionError},
	executor::ApiExecutor,
	http::{ApiHttpClient, ApiRequest, ApiResponse, TransportErrorMapper},
	obs::{self, CallSpan, RefreshOutcome, RefreshTrigger},
	session::timer::RefreshTimer,
};

/// Bearer session bound to one executor and one credential.
///
/// Dropping a session without [`close`](Self::close) aborts its refresh timer immediately.
pub struct Session<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	inner: Arc<SessionInner<C, M>>,
	timer: Mutex<Option<RefreshTimer>>,
}
impl<C, M> Session<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Authenticates with the password grant and starts the refresh timer.
	///
	/// Fails with [`ConfigError::MissingRefreshToken`] if the token endpoint does not issue a
	/// refresh token.
	pub async fn login(
		executor: ApiExecutor<C, M>,
		config: SessionConfig,
		username: &Username,
		password: &TokenSecret,
	) -> Result<Self> {
		let body =
			grant::password_form(&config.client_id, &config.client_secret, username, password);
		let response = executor
			.execute(ApiRequest::post(config.token_endpoint.clone()).with_body(body))
			.await?;
		let granted = grant::parse_token_response(&response)?;
		let refresh_token = granted.refresh_token.ok_or(ConfigError::MissingRefreshToken)?;

		Ok(Self::start(executor, config, TokenPair {
			access_token: granted.access_token,
			refresh_token,
		}))
	}

	/// Starts a session from a known pair (for example one persisted by the application).
	///
	/// Nothing is awaited. The function is `async` so it can only be called on a Tokio runtime,
	/// which the refresh timer is spawned onto.
	pub async fn resume(
		executor: ApiExecutor<C, M>,
		config: SessionConfig,
		pair: TokenPair,
	) -> Self {
		Self::start(executor, config, pair)
	}

	fn start(executor: ApiExecutor<C, M>, config: SessionConfig, pair: TokenPair) -> Self {
		let interval = config.refresh_interval;
		let inner = Arc::new(SessionInner {
			executor,
			config,
			credentials: CredentialStore::with_pair(pair),
			refresh_guard: AsyncMutex::new(()),
			metrics: Default::default(),
			closed: AtomicBool::new(false),
		});
		let timer = (!interval.is_zero()).then(|| {
			let inner = Arc::downgrade(&inner);

			RefreshTimer::spawn(interval, move |trigger| {
				let inner = inner.clone();

				async move {
					let Some(inner) = inner.upgrade() else {
						return;
					};

					if let Err(err) = inner.refresh(trigger).await {
						obs::refresh_failed(trigger, &err);
					}
				}
			})
		});

		Self { inner, timer: Mutex::new(timer) }
	}

	/// Executes `request` with the current access token attached as the bearer credential.
	pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
		self.inner.ensure_open()?;

		let token = self.inner.credentials.access_token()?;

		self.inner.executor.execute(request.with_bearer(token)).await
	}

	/// Refreshes now and returns the resulting pair.
	///
	/// If another refresh rotated the pair while this call waited, that pair is returned and no
	/// token exchange happens.
	pub async fn refresh_now(&self) -> Result<TokenPair> {
		self.inner.refresh(RefreshTrigger::Manual).await
	}

	/// Current access token.
	pub fn access_token(&self) -> Result<TokenSecret> {
		self.inner.ensure_open()?;

		Ok(self.inner.credentials.access_token()?)
	}

	/// Current refresh token.
	pub fn refresh_token(&self) -> Result<TokenSecret> {
		self.inner.ensure_open()?;

		Ok(self.inner.credentials.refresh_token()?)
	}

	/// Both tokens, read atomically.
	pub fn pair(&self) -> Result<TokenPair> {
		self.inner.ensure_open()?;

		Ok(self.inner.credentials.pair()?)
	}

	/// Credential lifecycle state.
	pub fn status(&self) -> CredentialStatus {
		if self.is_closed() { CredentialStatus::Closed } else { self.inner.credentials.status() }
	}

	/// Whether [`close`](Self::close) has been called.
	pub fn is_closed(&self) -> bool {
		self.inner.closed.load(Ordering::Acquire)
	}

	/// Refresh counters for this session.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.inner.metrics
	}

	/// Executor the session sends through.
	pub fn executor(&self) -> &ApiExecutor<C, M> {
		&self.inner.executor
	}

	/// Session settings.
	pub fn config(&self) -> &SessionConfig {
		&self.inner.config
	}

	/// Closes the session using [`SessionConfig::close_grace`].
	pub async fn close(&self) -> CloseOutcome {
		self.close_with_grace(self.inner.config.close_grace).await
	}

	/// Closes the session: new calls are rejected, the timer is stopped, an in-flight refresh
	/// gets up to `grace` to finish before it is aborted, then the credential is dropped.
	///
	/// Calls already sent through [`execute`](Self::execute) are not aborted.
	pub async fn close_with_grace(&self, grace: Duration) -> CloseOutcome {
		if self.inner.closed.swap(true, Ordering::AcqRel) {
			return CloseOutcome::AlreadyClosed;
		}

		let timer = self.timer.lock().take();
		let outcome = match timer {
			Some(timer) => timer.stop(grace).await,
			None => CloseOutcome::Drained,
		};

		self.inner.credentials.close();

		outcome
	}
}
impl<C, M> Drop for Session<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn drop(&mut self) {
		if let Some(timer) = self.timer.get_mut().take() {
			timer.abort();
		}
	}
}
impl<C, M> Debug for Session<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session")
			.field("status", &self.status())
			.field("token_endpoint", &self.inner.config.token_endpoint.as_str())
			.field("client_id", &self.inner.config.client_id)
			.field("metrics", &self.inner.metrics)
			.finish()
	}
}

struct SessionInner<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	executor: ApiExecutor<C, M>,
	config: SessionConfig,
	credentials: CredentialStore,
	refresh_guard: AsyncMutex<()>,
	metrics: RefreshMetrics,
	closed: AtomicBool,
}
impl<C, M> SessionInner<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn ensure_open(&self) -> Result<(), SessionError> {
		if self.closed.load(Ordering::Acquire) { Err(SessionError::Closed) } else { Ok(()) }
	}

	async fn refresh(&self, trigger: RefreshTrigger) -> Result<TokenPair> {
		let span = CallSpan::refresh(trigger);

		obs::record_refresh_outcome(trigger, RefreshOutcome::Attempt);
		self.metrics.record_attempt();

		let result = span.instrument(self.rotate()).await;
		let outcome = match &result {
			Ok((_, RefreshOutcome::Reused)) => {
				self.metrics.record_reuse();

				RefreshOutcome::Reused
			},
			Ok(_) => {
				self.metrics.record_rotation();

				RefreshOutcome::Success
			},
			Err(_) => {
				self.metrics.record_failure();

				RefreshOutcome::Failure
			},
		};

		obs::record_refresh_outcome(trigger, outcome);

		result.map(|(pair, _)| pair)
	}

	async fn rotate(&self) -> Result<(TokenPair, RefreshOutcome)> {
		self.ensure_open()?;

		let expected = self.credentials.refresh_token()?;
		let _singleflight = self.refresh_guard.lock().await;

		self.ensure_open()?;

		let current = self.credentials.pair()?;

		if current.refresh_token != expected {
			return Ok((current, RefreshOutcome::Reused));
		}

		let body =
			grant::refresh_form(&self.config.client_id, &self.config.client_secret, &expected);
		let response = self
			.executor
			.execute(ApiRequest::post(self.config.token_endpoint.clone()).with_body(body))
			.await?;
		let granted = grant::parse_token_response(&response)?;
		let pair = TokenPair {
			access_token: granted.access_token,
			refresh_token: granted.refresh_token.unwrap_or_else(|| expected.clone()),
		};

		match self.credentials.compare_and_swap(&expected, pair.clone())? {
			CompareAndSwapOutcome::Updated => Ok((pair, RefreshOutcome::Success)),
			CompareAndSwapOutcome::RefreshMismatch =>
				Ok((self.credentials.pair()?, RefreshOutcome::Reused)),
			CompareAndSwapOutcome::Missing => Err(SessionError::NotAuthenticated.into()),
		}
	}
}
