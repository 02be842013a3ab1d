//! Buffered upstream responses.

// std
use std::borrow::Cow;
// crates.io
use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	http::{HeaderMap, HttpResponse, StatusCode, header::RETRY_AFTER},
};

/// Raw upstream response returned on success and kept inside status-derived errors.
#[derive(Clone)]
pub struct ApiResponse {
	status: StatusCode,
	headers: HeaderMap,
	body: Vec<u8>,
	retry_after: Option<Duration>,
}
impl ApiResponse {
	/// Assembles a response from its parts and parses the `Retry-After` hint.
	pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
		let retry_after = parse_retry_after(&headers, OffsetDateTime::now_utc());

		Self { status, headers, body, retry_after }
	}

	/// Status code.
	pub fn status(&self) -> StatusCode {
		self.status
	}

	/// Response headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Raw body bytes.
	pub fn body(&self) -> &[u8] {
		&self.body
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.body)
	}

	/// Consumes the response and returns the body bytes.
	pub fn into_body(self) -> Vec<u8> {
		self.body
	}

	/// Deserializes the body, reporting the JSON path of the first mismatch.
	pub fn json<T>(&self) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de)
	}

	/// Relative delay from the `Retry-After` header, if present and in the future.
	pub fn retry_after(&self) -> Option<Duration> {
		self.retry_after
	}
}
impl From<HttpResponse> for ApiResponse {
	fn from(response: HttpResponse) -> Self {
		let (parts, body) = response.into_parts();

		Self::new(parts.status, parts.headers, body)
	}
}
impl Debug for ApiResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiResponse")
			.field("status", &self.status)
			.field("headers", &self.headers)
			.field("body_len", &self.body.len())
			.field("retry_after", &self.retry_after)
			.finish()
	}
}

fn parse_retry_after(headers: &HeaderMap, now: OffsetDateTime) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::from_secs(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - now;

		if delta.is_positive() {
			return Duration::try_from(delta).ok();
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::http::HeaderValue;

	fn headers_with_retry(value: &'static str) -> HeaderMap {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static(value));

		headers
	}

	#[test]
	fn retry_after_accepts_delta_seconds_and_dates() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);

		assert_eq!(
			parse_retry_after(&headers_with_retry("120"), now),
			Some(Duration::from_secs(120))
		);
		assert_eq!(
			parse_retry_after(&headers_with_retry("Wed, 01 Jan 2025 00:00:30 +0000"), now),
			Some(Duration::from_secs(30))
		);
		assert_eq!(
			parse_retry_after(&headers_with_retry("Tue, 31 Dec 2024 23:59:00 +0000"), now),
			None
		);
		assert_eq!(parse_retry_after(&headers_with_retry("soon"), now), None);
		assert_eq!(parse_retry_after(&HeaderMap::new(), now), None);
	}

	#[test]
	fn body_helpers_expose_raw_and_typed_views() {
		let response = ApiResponse::new(
			StatusCode::OK,
			HeaderMap::new(),
			br#"{"result":"ok","data":{"id":"x"}}"#.to_vec(),
		);

		assert_eq!(response.text(), r#"{"result":"ok","data":{"id":"x"}}"#);

		#[derive(Deserialize)]
		struct Envelope {
			result: String,
		}

		let envelope: Envelope = response.json().expect("Envelope should deserialize.");

		assert_eq!(envelope.result, "ok");

		#[derive(Debug, Deserialize)]
		#[allow(dead_code)]
		struct Strict {
			data: StrictData,
		}
		#[derive(Debug, Deserialize)]
		#[allow(dead_code)]
		struct StrictData {
			id: u32,
		}

		let err = response.json::<Strict>().expect_err("Mismatched type should fail.");

		assert_eq!(err.path().to_string(), "data.id");
	}
}
