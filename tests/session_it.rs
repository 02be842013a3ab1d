#![cfg(feature = "reqwest")]

// std
use std::{sync::Arc, time::Duration};
// crates.io
use httpmock::prelude::*;
// self
use mangadex_core::{
	auth::{ClientId, CredentialStatus, TokenPair, TokenSecret, Username},
	error::{ConfigError, Error, SessionError},
	executor::{ExecutorConfig, ReqwestApiExecutor},
	http::ApiRequest,
	session::{CloseOutcome, Session, SessionConfig},
	url::Url,
};

const CLIENT_ID: &str = "personal-client-session";
const CLIENT_SECRET: &str = "client-secret-session";

fn build_executor(server: &MockServer) -> ReqwestApiExecutor {
	let config = ExecutorConfig::default()
		.with_api_base(&server.base_url())
		.with_request_timeout(Duration::from_secs(5));

	ReqwestApiExecutor::new(config).expect("Executor should build for tests.")
}

fn build_config(server: &MockServer) -> SessionConfig {
	let endpoint = Url::parse(&server.url("/realms/mangadex/protocol/openid-connect/token"))
		.expect("Token endpoint should parse.");
	let client_id = ClientId::new(CLIENT_ID).expect("Client fixture should be valid.");

	SessionConfig::new(endpoint, client_id, TokenSecret::new(CLIENT_SECRET))
		.with_refresh_interval(Duration::ZERO)
}

fn token_body(access: &str, refresh: &str) -> String {
	format!(
		r#"{{"access_token":"{access}","refresh_token":"{refresh}","token_type":"Bearer","expires_in":900}}"#
	)
}

#[tokio::test]
async fn login_uses_the_password_grant_and_authenticates_calls() {
	let server = MockServer::start_async().await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/realms/mangadex/protocol/openid-connect/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.form_urlencoded_tuple("grant_type", "password")
				.form_urlencoded_tuple("username", "reader")
				.form_urlencoded_tuple("password", "hunter2")
				.form_urlencoded_tuple("client_id", CLIENT_ID)
				.form_urlencoded_tuple("client_secret", CLIENT_SECRET);
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("access-1", "refresh-1"));
		})
		.await;
	let me = server
		.mock_async(|when, then| {
			when.method(GET).path("/user/me").header("authorization", "Bearer access-1");
			then.status(200).body(r#"{"result":"ok"}"#);
		})
		.await;
	let username = Username::new("reader").expect("Username fixture should be valid.");
	let session = Session::login(
		build_executor(&server),
		build_config(&server),
		&username,
		&TokenSecret::new("hunter2"),
	)
	.await
	.expect("Login should succeed.");

	login.assert_async().await;

	assert_eq!(session.status(), CredentialStatus::Authenticated);
	assert_eq!(session.access_token().expect("Access token should be readable.").expose(), "access-1");

	session
		.execute(ApiRequest::get(Url::parse(&server.url("/user/me")).expect("URL should parse.")))
		.await
		.expect("Authenticated call should succeed.");

	me.assert_async().await;
}

#[tokio::test]
async fn login_without_refresh_token_is_rejected() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/realms/mangadex/protocol/openid-connect/token");
			then.status(200).body(r#"{"access_token":"access-1","token_type":"Bearer"}"#);
		})
		.await;

	let err = Session::login(
		build_executor(&server),
		build_config(&server),
		&Username::new("reader").expect("Username fixture should be valid."),
		&TokenSecret::new("hunter2"),
	)
	.await
	.expect_err("Login without a refresh token must fail.");

	assert!(matches!(err, Error::Config(ConfigError::MissingRefreshToken)));
}

#[tokio::test]
async fn rejected_and_malformed_token_responses_surface_typed_errors() {
	let server = MockServer::start_async().await;
	let mut rejected = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/realms/mangadex/protocol/openid-connect/token")
				.form_urlencoded_tuple("grant_type", "refresh_token");
			then.status(400).body(r#"{"error":"invalid_grant"}"#);
		})
		.await;
	let session = Session::resume(
		build_executor(&server),
		build_config(&server),
		TokenPair::new("access-0", "refresh-0"),
	)
	.await;
	let err = session.refresh_now().await.expect_err("Rejected refresh must fail.");

	assert!(matches!(err, Error::ClientError { .. }));
	assert_eq!(err.status(), Some(400));
	assert_eq!(
		session.pair().expect("Pair should survive a failed refresh."),
		TokenPair::new("access-0", "refresh-0")
	);

	rejected.delete_async().await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/realms/mangadex/protocol/openid-connect/token");
			then.status(200).body(r#"{"access_token":["not","a","string"],"token_type":"Bearer"}"#);
		})
		.await;

	let err = session.refresh_now().await.expect_err("Malformed token document must fail.");

	assert!(matches!(err, Error::TokenResponse { status: 200, .. }));
	assert_eq!(session.metrics().failures(), 2);
}

#[tokio::test]
async fn refresh_rotates_both_tokens() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/realms/mangadex/protocol/openid-connect/token")
				.form_urlencoded_tuple("grant_type", "refresh_token")
				.form_urlencoded_tuple("refresh_token", "refresh-0")
				.form_urlencoded_tuple("client_id", CLIENT_ID);
			then.status(200).body(token_body("access-1", "refresh-1"));
		})
		.await;
	let session = Session::resume(
		build_executor(&server),
		build_config(&server),
		TokenPair::new("access-0", "refresh-0"),
	)
	.await;
	let pair = session.refresh_now().await.expect("Refresh should succeed.");

	mock.assert_async().await;

	assert_eq!(pair, TokenPair::new("access-1", "refresh-1"));
	assert_eq!(session.refresh_token().expect("Refresh token should be readable.").expose(), "refresh-1");
	assert_eq!(session.metrics().rotations(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_refreshes_spend_the_refresh_token_once() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/realms/mangadex/protocol/openid-connect/token")
				.form_urlencoded_tuple("refresh_token", "refresh-0");
			then.status(200).delay(Duration::from_millis(300)).body(token_body("access-1", "refresh-1"));
		})
		.await;
	let session = Arc::new(
		Session::resume(
			build_executor(&server),
			build_config(&server),
			TokenPair::new("access-0", "refresh-0"),
		)
		.await,
	);
	let tasks = (0..3)
		.map(|_| {
			let session = session.clone();

			tokio::spawn(async move { session.refresh_now().await })
		})
		.collect::<Vec<_>>();

	for task in tasks {
		let pair = task.await.expect("Refresh task should not panic.").expect("Refresh should succeed.");

		assert_eq!(pair, TokenPair::new("access-1", "refresh-1"));
	}

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn close_drains_idle_timers_and_rejects_later_calls() {
	let server = MockServer::start_async().await;
	let session = Session::resume(
		build_executor(&server),
		build_config(&server).with_refresh_interval(Duration::from_secs(3600)),
		TokenPair::new("access-0", "refresh-0"),
	)
	.await;

	assert_eq!(session.close_with_grace(Duration::from_secs(1)).await, CloseOutcome::Drained);
	assert!(matches!(session.pair(), Err(Error::Session(SessionError::Closed))));
	assert!(matches!(
		session
			.execute(ApiRequest::get(Url::parse(&server.url("/user/me")).expect("URL should parse.")))
			.await,
		Err(Error::Session(SessionError::Closed))
	));
}
