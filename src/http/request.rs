//! Outbound request description handed to the executor.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ConfigError,
	http::{HeaderMap, HeaderName, HeaderValue, HttpRequest, Method, header},
};

/// Encoded request payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestBody {
	/// Pre-serialized JSON document sent as `application/json`.
	Json(Vec<u8>),
	/// Key/value pairs sent as `application/x-www-form-urlencoded`.
	Form(Vec<(String, String)>),
}
impl RequestBody {
	/// Serializes `value` into a JSON body.
	pub fn json<T>(value: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		Ok(Self::Json(serde_json::to_vec(value)?))
	}

	/// Collects form pairs in the given order.
	pub fn form<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self::Form(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}

	/// Content type matching the encoding.
	pub fn content_type(&self) -> &'static str {
		match self {
			Self::Json(_) => "application/json",
			Self::Form(_) => "application/x-www-form-urlencoded",
		}
	}

	/// Encodes the payload into wire bytes.
	pub fn encode(&self) -> Vec<u8> {
		match self {
			Self::Json(bytes) => bytes.clone(),
			Self::Form(pairs) => url::form_urlencoded::Serializer::new(String::new())
				.extend_pairs(pairs.iter())
				.finish()
				.into_bytes(),
		}
	}
}

/// A single API call: method, absolute URL, optional body and bearer credential.
///
/// The pipeline does no JSON interpretation; callers hand over fully formed URLs and bodies.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute target URL, including any query string.
	pub url: Url,
	/// Optional payload.
	pub body: Option<RequestBody>,
	/// Bearer credential attached as `Authorization: Bearer <token>`.
	pub bearer: Option<TokenSecret>,
	/// Extra headers; the pipeline sets `Accept`, `Content-Type`, and `Authorization` itself.
	pub headers: HeaderMap,
}
impl ApiRequest {
	/// Creates a request without body or credential.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, body: None, bearer: None, headers: HeaderMap::new() }
	}

	/// Shorthand for a `GET` request.
	pub fn get(url: Url) -> Self {
		Self::new(Method::GET, url)
	}

	/// Shorthand for a `POST` request.
	pub fn post(url: Url) -> Self {
		Self::new(Method::POST, url)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(url: Url) -> Self {
		Self::new(Method::PUT, url)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(url: Url) -> Self {
		Self::new(Method::DELETE, url)
	}

	/// Attaches a payload.
	pub fn with_body(mut self, body: RequestBody) -> Self {
		self.body = Some(body);

		self
	}

	/// Attaches a bearer credential.
	pub fn with_bearer(mut self, token: TokenSecret) -> Self {
		self.bearer = Some(token);

		self
	}

	/// Adds an extra header, replacing any previous value.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Builds the transport request.
	pub fn into_http(self) -> Result<HttpRequest, ConfigError> {
		let payload = self.body.as_ref().map(RequestBody::encode).unwrap_or_default();
		let mut request =
			oauth2::http::Request::builder().method(self.method).uri(self.url.as_str()).body(payload)?;
		let headers = request.headers_mut();

		headers.extend(self.headers);
		headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

		if let Some(body) = &self.body {
			headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(body.content_type()));
		}
		if let Some(token) = &self.bearer {
			let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))?;

			value.set_sensitive(true);
			headers.insert(header::AUTHORIZATION, value);
		}

		Ok(request)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("URL fixture should parse.")
	}

	#[test]
	fn form_bodies_are_url_encoded() {
		let body = RequestBody::form([("grant_type", "refresh_token"), ("refresh_token", "a b&c")]);

		assert_eq!(body.content_type(), "application/x-www-form-urlencoded");
		assert_eq!(body.encode(), b"grant_type=refresh_token&refresh_token=a+b%26c".to_vec());
	}

	#[test]
	fn bearer_and_body_headers_are_attached() {
		let request = ApiRequest::post(url("https://api.mangadex.org/report"))
			.with_body(
				RequestBody::json(&serde_json::json!({ "category": "manga" }))
					.expect("JSON fixture should serialize."),
			)
			.with_bearer(TokenSecret::new("access-1"))
			.into_http()
			.expect("Request should build.");

		assert_eq!(request.method(), Method::POST);
		assert_eq!(request.uri(), "https://api.mangadex.org/report");
		assert_eq!(request.headers()[header::AUTHORIZATION], "Bearer access-1");
		assert!(request.headers()[header::AUTHORIZATION].is_sensitive());
		assert_eq!(request.headers()[header::CONTENT_TYPE], "application/json");
		assert_eq!(request.body(), br#"{"category":"manga"}"#);
	}

	#[test]
	fn bodiless_requests_omit_content_type() {
		let request = ApiRequest::get(url("https://api.mangadex.org/manga?limit=10"))
			.into_http()
			.expect("Request should build.");

		assert!(request.headers().get(header::CONTENT_TYPE).is_none());
		assert!(request.headers().get(header::AUTHORIZATION).is_none());
		assert!(request.body().is_empty());
	}

	#[test]
	fn debug_output_redacts_bearer() {
		let request = ApiRequest::get(url("https://api.mangadex.org/user/me"))
			.with_bearer(TokenSecret::new("super-secret"));

		assert!(!format!("{request:?}").contains("super-secret"));
	}
}
