#![cfg(feature = "reqwest")]

// std
use std::time::Duration;
// crates.io
use httpmock::prelude::*;
// self
use mangadex_core::{
	auth::TokenSecret,
	error::Error,
	executor::{ExecutorConfig, ReqwestApiExecutor},
	http::{ApiRequest, RequestBody},
	url::Url,
};

const MANGA_ID: &str = "f9c33607-9180-4ba6-b85c-e4b5faee7192";

fn build_executor(base: &str, request_timeout: Duration) -> ReqwestApiExecutor {
	let config = ExecutorConfig::default()
		.with_api_base(base)
		.with_connect_timeout(Duration::from_secs(2))
		.with_request_timeout(request_timeout);

	ReqwestApiExecutor::new(config).expect("Executor should build for tests.")
}

fn url(server: &MockServer, path: &str) -> Url {
	Url::parse(&server.url(path)).expect("Mock URL should parse.")
}

#[tokio::test]
async fn success_returns_the_raw_body_and_sends_the_bearer() {
	let server = MockServer::start_async().await;
	let executor = build_executor(&server.base_url(), Duration::from_secs(2));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(format!("/manga/{MANGA_ID}"))
				.query_param("includes[]", "author")
				.header("authorization", "Bearer access-1")
				.header("accept", "application/json");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"result":"ok","data":{"id":"f9c33607"}}"#);
		})
		.await;
	let request = ApiRequest::get(url(&server, &format!("/manga/{MANGA_ID}?includes[]=author")))
		.with_bearer(TokenSecret::new("access-1"));
	let response = executor.execute(request).await.expect("Call should succeed.");

	mock.assert_async().await;

	assert_eq!(response.status().as_u16(), 200);
	assert_eq!(response.text(), r#"{"result":"ok","data":{"id":"f9c33607"}}"#);
}

#[tokio::test]
async fn statuses_map_onto_typed_errors_with_the_body_kept() {
	let server = MockServer::start_async().await;
	let executor = build_executor(&server.base_url(), Duration::from_secs(2));

	for (path, status) in
		[("/unauthorized", 401), ("/missing", 404), ("/slow", 408), ("/down", 503), ("/odd", 599)]
	{
		server
			.mock_async(|when, then| {
				when.method(GET).path(path);
				then.status(status).body(format!(r#"{{"result":"error","status":{status}}}"#));
			})
			.await;
	}

	let call = |path: &str| executor.execute(ApiRequest::get(url(&server, path)));
	let err = call("/unauthorized").await.expect_err("401 should fail.");

	assert!(matches!(err, Error::Unauthorized { .. }));
	assert!(!err.is_retryable());

	let err = call("/missing").await.expect_err("404 should fail.");

	assert!(matches!(err, Error::ClientError { .. }));
	assert_eq!(
		err.response().map(|response| response.text().into_owned()),
		Some(r#"{"result":"error","status":404}"#.into())
	);

	let err = call("/slow").await.expect_err("408 should fail.");

	assert!(matches!(err, Error::Timeout { status: Some(408), .. }));
	assert!(err.response().is_none());

	let err = call("/down").await.expect_err("503 should fail.");

	assert!(matches!(err, Error::ServerError { .. }));
	assert!(err.is_retryable());

	let err = call("/odd").await.expect_err("599 should fail.");

	assert!(matches!(err, Error::UnexpectedStatus { .. }));
	assert_eq!(err.status(), Some(599));
}

#[tokio::test]
async fn too_many_requests_exposes_retry_after() {
	let server = MockServer::start_async().await;
	let executor = build_executor(&server.base_url(), Duration::from_secs(2));

	server
		.mock_async(|when, then| {
			when.method(GET).path("/manga/random");
			then.status(429).header("retry-after", "17").body(r#"{"result":"error"}"#);
		})
		.await;

	let err = executor
		.execute(ApiRequest::get(url(&server, "/manga/random")))
		.await
		.expect_err("429 should fail.");

	assert!(matches!(err, Error::ClientError { .. }));
	assert!(err.is_retryable());
	assert_eq!(err.retry_after(), Some(Duration::from_secs(17)));
}

#[tokio::test]
async fn deadline_maps_to_timeout_without_a_body() {
	let server = MockServer::start_async().await;
	let executor = build_executor(&server.base_url(), Duration::from_millis(300));

	server
		.mock_async(|when, then| {
			when.method(GET).path("/statistics/manga");
			then.status(200).delay(Duration::from_secs(3)).body("{}");
		})
		.await;

	let err = executor
		.execute(ApiRequest::get(url(&server, "/statistics/manga")))
		.await
		.expect_err("Slow response should time out.");

	assert!(matches!(err, Error::Timeout { status: None, source: Some(_) }));
	assert!(err.response().is_none());
}

#[tokio::test]
async fn refused_connections_map_to_network() {
	let executor = build_executor("http://127.0.0.1:1", Duration::from_secs(2));
	let request = ApiRequest::get(Url::parse("http://127.0.0.1:1/ping").expect("URL should parse."));
	let err = executor.execute(request).await.expect_err("Port 1 should refuse connections.");

	assert!(matches!(err, Error::Network { .. }), "Unexpected error: {err:?}");
}

#[tokio::test]
async fn json_and_form_bodies_carry_their_content_types() {
	let server = MockServer::start_async().await;
	let executor = build_executor(&server.base_url(), Duration::from_secs(2));
	let report = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/report")
				.header("content-type", "application/json")
				.body(r#"{"category":"manga","reason":"spam"}"#);
			then.status(201).body(r#"{"result":"ok"}"#);
		})
		.await;
	let form = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/captcha/solve")
				.header("content-type", "application/x-www-form-urlencoded")
				.form_urlencoded_tuple("captchaChallenge", "abc 123");
			then.status(200).body(r#"{"result":"ok"}"#);
		})
		.await;
	let body = RequestBody::json(&serde_json::json!({ "category": "manga", "reason": "spam" }))
		.expect("JSON body should serialize.");

	executor
		.execute(ApiRequest::post(url(&server, "/report")).with_body(body))
		.await
		.expect("JSON call should succeed.");
	executor
		.execute(
			ApiRequest::post(url(&server, "/captcha/solve"))
				.with_body(RequestBody::form([("captchaChallenge", "abc 123")])),
		)
		.await
		.expect("Form call should succeed.");

	report.assert_async().await;
	form.assert_async().await;
}
