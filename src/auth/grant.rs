//! OpenID Connect token endpoint grants used by sessions.
//!
//! MangaDex personal clients authenticate with the resource-owner password grant and rotate
//! with the refresh-token grant. Both are form posts carrying the client credentials; the
//! response is a standard OAuth 2.0 token document.

// crates.io
use oauth2::{TokenResponse, basic::BasicTokenResponse};
// self
use crate::{
	_prelude::*,
	auth::{ClientId, TokenSecret, Username},
	http::{ApiResponse, RequestBody},
};

/// `grant_type` for the resource-owner password grant.
pub const GRANT_TYPE_PASSWORD: &str = "password";
/// `grant_type` for refresh-token rotation.
pub const GRANT_TYPE_REFRESH_TOKEN: &str = "refresh_token";

/// Tokens issued by one grant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrantedTokens {
	/// New access token.
	pub access_token: TokenSecret,
	/// Rotated refresh token; absent when the server keeps the previous one valid.
	pub refresh_token: Option<TokenSecret>,
	/// Access token lifetime reported by the server.
	pub expires_in: Option<Duration>,
}

/// Form body for the password grant.
pub fn password_form(
	client_id: &ClientId,
	client_secret: &TokenSecret,
	username: &Username,
	password: &TokenSecret,
) -> RequestBody {
	RequestBody::form([
		("grant_type", GRANT_TYPE_PASSWORD),
		("username", username.as_ref()),
		("password", password.expose()),
		("client_id", client_id.as_ref()),
		("client_secret", client_secret.expose()),
	])
}

/// Form body for the refresh-token grant.
pub fn refresh_form(
	client_id: &ClientId,
	client_secret: &TokenSecret,
	refresh_token: &TokenSecret,
) -> RequestBody {
	RequestBody::form([
		("grant_type", GRANT_TYPE_REFRESH_TOKEN),
		("refresh_token", refresh_token.expose()),
		("client_id", client_id.as_ref()),
		("client_secret", client_secret.expose()),
	])
}

/// Parses a successful token endpoint response.
pub fn parse_token_response(response: &ApiResponse) -> Result<GrantedTokens> {
	let token = response.json::<BasicTokenResponse>().map_err(|source| Error::TokenResponse {
		source,
		status: response.status().as_u16(),
	})?;

	Ok(GrantedTokens {
		access_token: TokenSecret::new(token.access_token().secret().as_str()),
		refresh_token: token.refresh_token().map(|t| TokenSecret::new(t.secret().as_str())),
		expires_in: token.expires_in(),
	})
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::http::{HeaderMap, StatusCode};

	fn client() -> (ClientId, TokenSecret) {
		(
			ClientId::new("personal-client-1").expect("Client fixture should be valid."),
			TokenSecret::new("client-secret"),
		)
	}

	fn ok(body: &str) -> ApiResponse {
		ApiResponse::new(StatusCode::OK, HeaderMap::new(), body.as_bytes().to_vec())
	}

	#[test]
	fn forms_carry_grant_and_client_credentials() {
		let (client_id, client_secret) = client();
		let username = Username::new("reader").expect("Username fixture should be valid.");
		let password = password_form(&client_id, &client_secret, &username, &TokenSecret::new("p&w"));

		assert_eq!(
			String::from_utf8(password.encode()).expect("Form should be UTF-8."),
			"grant_type=password&username=reader&password=p%26w&client_id=personal-client-1&client_secret=client-secret"
		);

		let refresh = refresh_form(&client_id, &client_secret, &TokenSecret::new("refresh-1"));

		assert_eq!(
			String::from_utf8(refresh.encode()).expect("Form should be UTF-8."),
			"grant_type=refresh_token&refresh_token=refresh-1&client_id=personal-client-1&client_secret=client-secret"
		);
	}

	#[test]
	fn token_documents_are_parsed() {
		let granted = parse_token_response(&ok(
			r#"{"access_token":"access-1","refresh_token":"refresh-1","token_type":"Bearer","expires_in":900}"#,
		))
		.expect("Token document should parse.");

		assert_eq!(granted.access_token.expose(), "access-1");
		assert_eq!(granted.refresh_token, Some(TokenSecret::new("refresh-1")));
		assert_eq!(granted.expires_in, Some(Duration::from_secs(900)));

		let without_refresh =
			parse_token_response(&ok(r#"{"access_token":"access-2","token_type":"bearer"}"#))
				.expect("Refresh token is optional.");

		assert!(without_refresh.refresh_token.is_none());
	}

	#[test]
	fn malformed_documents_report_the_path() {
		let err = parse_token_response(&ok(r#"{"access_token":42,"token_type":"Bearer"}"#))
			.expect_err("Numeric access token must be rejected.");

		match err {
			Error::TokenResponse { source, status } => {
				assert_eq!(status, 200);
				assert_eq!(source.path().to_string(), "access_token");
			},
			other => panic!("Unexpected error: {other:?}"),
		}
	}
}
