//! Validated names sent to the token endpoint.

// std
use std::str::FromStr;
// self
use crate::_prelude::*;

/// Longest personal client id MangaDex issues, with headroom.
pub const CLIENT_ID_MAX_LEN: usize = 128;
/// Longest username MangaDex accepts at registration.
pub const USERNAME_MAX_LEN: usize = 64;

macro_rules! credential_name {
	($name:ident, $doc:literal, $kind:literal, $max:expr) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates `value`; it must be non-empty and free of whitespace.
			pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
				let value = value.into();

				validate($kind, $max, &value)?;

				Ok(Self(value))
			}

			/// Raw value as sent in the grant form.
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

/// Rejected client id or username.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// Nothing to send.
	#[error("{kind} cannot be empty.")]
	Empty {
		/// `Client` or `Username`.
		kind: &'static str,
	},
	/// Whitespace would be mangled by the form encoding the server expects.
	#[error("{kind} contains whitespace.")]
	ContainsWhitespace {
		/// `Client` or `Username`.
		kind: &'static str,
	},
	/// Longer than the server accepts.
	#[error("{kind} exceeds {max} characters.")]
	TooLong {
		/// `Client` or `Username`.
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

credential_name! { ClientId, "Personal API client identifier issued by MangaDex.", "Client", CLIENT_ID_MAX_LEN }
credential_name! { Username, "Account name used for the password grant.", "Username", USERNAME_MAX_LEN }

fn validate(kind: &'static str, max: usize, value: &str) -> Result<(), IdentifierError> {
	if value.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if value.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if value.chars().count() > max {
		return Err(IdentifierError::TooLong { kind, max });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn whitespace_and_empty_values_are_rejected() {
		assert_eq!(
			ClientId::new(" personal-client").expect_err("Leading whitespace must be rejected."),
			IdentifierError::ContainsWhitespace { kind: "Client" }
		);
		assert!(ClientId::new("personal-client\t").is_err());
		assert!(Username::new(format!("reader{}42", '\u{00A0}')).is_err());
		assert_eq!(
			Username::new("").expect_err("Empty username must be rejected."),
			IdentifierError::Empty { kind: "Username" }
		);

		let client =
			ClientId::new("personal-client-abc").expect("Client fixture should be considered valid.");

		assert_eq!(client.as_str(), "personal-client-abc");
		assert_eq!(format!("{client:?}"), "Client(personal-client-abc)");
		assert_eq!(client.to_string(), "personal-client-abc");
	}

	#[test]
	fn limits_differ_per_kind() {
		Username::new("a".repeat(USERNAME_MAX_LEN)).expect("Exact length should succeed.");
		ClientId::new("a".repeat(USERNAME_MAX_LEN + 1)).expect("Client ids may be longer.");

		assert_eq!(
			Username::new("a".repeat(USERNAME_MAX_LEN + 1)).expect_err("Long username must fail."),
			IdentifierError::TooLong { kind: "Username", max: USERNAME_MAX_LEN }
		);
		assert!(ClientId::new("a".repeat(CLIENT_ID_MAX_LEN + 1)).is_err());
	}

	#[test]
	fn parsing_and_serde_go_through_validation() {
		let client: ClientId = "personal-client-xyz".parse().expect("Client id should parse.");

		assert_eq!(client.as_ref(), "personal-client-xyz");
		assert!("two words".parse::<Username>().is_err());

		let user: Username =
			serde_json::from_str("\"reader_42\"").expect("Username should deserialize successfully.");

		assert_eq!(user.as_str(), "reader_42");
		assert!(serde_json::from_str::<Username>("\"with space\"").is_err());
		assert_eq!(serde_json::to_string(&user).expect("Username should serialize."), "\"reader_42\"");
	}
}
