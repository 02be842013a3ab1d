// self
use crate::{
	_prelude::*,
	auth::{ClientId, TokenSecret},
	error::ConfigError,
};

/// MangaDex OpenID Connect token endpoint.
pub const MANGADEX_TOKEN_ENDPOINT: &str =
	"https://auth.mangadex.org/realms/mangadex/protocol/openid-connect/token";
/// Default period of the background refresh timer.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);
/// Default time [`Session::close`](crate::session::Session::close) waits for an in-flight
/// refresh before aborting it.
pub const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Token endpoint, client credentials, and refresh timing for one session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
	/// Token endpoint used for the password and refresh-token grants.
	pub token_endpoint: Url,
	/// Personal API client identifier.
	pub client_id: ClientId,
	/// Personal API client secret.
	pub client_secret: TokenSecret,
	/// Background refresh period; zero disables the timer.
	pub refresh_interval: Duration,
	/// Grace period used by [`Session::close`](crate::session::Session::close).
	pub close_grace: Duration,
}
impl SessionConfig {
	/// Creates a config with default timing.
	pub fn new(token_endpoint: Url, client_id: ClientId, client_secret: TokenSecret) -> Self {
		Self {
			token_endpoint,
			client_id,
			client_secret,
			refresh_interval: DEFAULT_REFRESH_INTERVAL,
			close_grace: DEFAULT_CLOSE_GRACE,
		}
	}

	/// Creates a config against [`MANGADEX_TOKEN_ENDPOINT`].
	pub fn mangadex(client_id: ClientId, client_secret: TokenSecret) -> Result<Self, ConfigError> {
		let endpoint = Url::parse(MANGADEX_TOKEN_ENDPOINT).map_err(|source| {
			ConfigError::InvalidUrl { url: MANGADEX_TOKEN_ENDPOINT.into(), source }
		})?;

		Ok(Self::new(endpoint, client_id, client_secret))
	}

	/// Overrides the token endpoint.
	pub fn with_token_endpoint(mut self, endpoint: Url) -> Self {
		self.token_endpoint = endpoint;

		self
	}

	/// Overrides the background refresh period; [`Duration::ZERO`] disables the timer.
	pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
		self.refresh_interval = interval;

		self
	}

	/// Overrides the close grace period.
	pub fn with_close_grace(mut self, grace: Duration) -> Self {
		self.close_grace = grace;

		self
	}
}
