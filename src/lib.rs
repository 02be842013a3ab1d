//! Rate-limited request pipeline for MangaDex clients, plus a bearer session that keeps its
//! credential fresh in the background.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod executor;
pub mod http;
pub mod limiter;
pub mod obs;
pub mod quota;
pub mod session;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{ClientId, TokenSecret},
		executor::{ApiExecutor, ExecutorConfig},
		http::{
			ApiHttpClient, HttpRequest, HttpResponse, StatusCode, TransportErrorMapper,
			TransportFuture,
		},
		session::SessionConfig,
	};

	/// Client identifier used by session fixtures.
	pub const TEST_CLIENT_ID: &str = "personal-client-test";
	/// Client secret used by session fixtures.
	pub const TEST_CLIENT_SECRET: &str = "client-secret-test";

	type ScriptedHandler =
		dyn Fn(&HttpRequest) -> std::result::Result<HttpResponse, ScriptedError> + Send + Sync;

	/// Failures a [`ScriptedHttpClient`] can simulate.
	#[derive(Debug, ThisError)]
	pub enum ScriptedError {
		/// Simulated deadline.
		#[error("Scripted transport timed out.")]
		Timeout,
		/// Simulated connection reset.
		#[error("Scripted connection was reset.")]
		Reset,
	}

	/// In-process transport that answers through a closure after an optional latency.
	pub struct ScriptedHttpClient {
		handler: Box<ScriptedHandler>,
		latency: Duration,
	}
	impl ScriptedHttpClient {
		/// Answers every request with `handler`.
		pub fn new<F>(handler: F) -> Self
		where
			F: 'static
				+ Send
				+ Sync
				+ Fn(&HttpRequest) -> std::result::Result<HttpResponse, ScriptedError>,
		{
			Self { handler: Box::new(handler), latency: Duration::ZERO }
		}

		/// Delays every answer by `latency` (virtual time under a paused runtime).
		pub fn with_latency(mut self, latency: Duration) -> Self {
			self.latency = latency;

			self
		}
	}
	impl ApiHttpClient for ScriptedHttpClient {
		type TransportError = ScriptedError;

		fn send(&self, request: HttpRequest) -> TransportFuture<'_, ScriptedError> {
			Box::pin(async move {
				if !self.latency.is_zero() {
					tokio::time::sleep(self.latency).await;
				}

				(self.handler)(&request)
			})
		}
	}

	/// Maps [`ScriptedError`] onto the crate taxonomy.
	#[derive(Clone, Debug, Default)]
	pub struct ScriptedTransportErrorMapper;
	impl TransportErrorMapper<ScriptedError> for ScriptedTransportErrorMapper {
		fn map_transport_error(&self, error: ScriptedError) -> Error {
			match error {
				ScriptedError::Timeout => Error::timeout(error),
				ScriptedError::Reset => Error::network(error),
			}
		}
	}

	/// Executor specialized for [`ScriptedHttpClient`].
	pub type ScriptedApiExecutor = ApiExecutor<ScriptedHttpClient, ScriptedTransportErrorMapper>;

	/// Builds an executor over `client` with the compiled-in MangaDex catalog.
	pub fn build_scripted_executor(client: ScriptedHttpClient) -> ScriptedApiExecutor {
		ApiExecutor::with_http_client(ExecutorConfig::default(), client, ScriptedTransportErrorMapper)
	}

	/// Builds a JSON response with `status` and `body`.
	pub fn json_response(status: u16, body: &str) -> HttpResponse {
		let mut response = HttpResponse::new(body.as_bytes().to_vec());

		*response.status_mut() =
			StatusCode::from_u16(status).expect("Status fixture should be valid.");

		response
	}

	/// Builds a session config that exchanges tokens against `token_endpoint`.
	pub fn build_test_session_config(token_endpoint: &str) -> SessionConfig {
		let endpoint = Url::parse(token_endpoint).expect("Token endpoint fixture should parse.");
		let client_id = ClientId::new(TEST_CLIENT_ID).expect("Client id fixture should be valid.");

		SessionConfig::new(endpoint, client_id, TokenSecret::new(TEST_CLIENT_SECRET))
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
