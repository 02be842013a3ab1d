//! Shared access/refresh token pair guarded by a single lock.
//!
//! Both tokens live behind one [`Mutex`], so a reader never observes an access token from one
//! refresh paired with a refresh token from another. The store also carries the session
//! lifecycle: reads before the first write fail with [`SessionError::NotAuthenticated`] and
//! every operation after [`CredentialStore::close`] fails with [`SessionError::Closed`].

// self
use crate::{_prelude::*, auth::TokenSecret, error::SessionError};

/// Access token plus the refresh token that rotates it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
	/// Bearer credential attached to authenticated calls.
	pub access_token: TokenSecret,
	/// Credential exchanged for the next pair.
	pub refresh_token: TokenSecret,
}
impl TokenPair {
	/// Pairs the two secrets.
	pub fn new(access_token: impl Into<TokenSecret>, refresh_token: impl Into<TokenSecret>) -> Self {
		Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
	}
}

/// Lifecycle state observed on a [`CredentialStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialStatus {
	/// No pair stored yet.
	Unauthenticated,
	/// A pair is available.
	Authenticated,
	/// The store was closed and its pair dropped.
	Closed,
}

/// Result of a refresh-token compare-and-swap attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareAndSwapOutcome {
	/// The refresh token matched the expected value and the pair was replaced.
	Updated,
	/// A pair exists but its refresh token was already rotated by someone else.
	RefreshMismatch,
	/// No pair is stored yet.
	Missing,
}

#[derive(Default)]
enum CredentialState {
	#[default]
	Unauthenticated,
	Authenticated {
		pair: TokenPair,
		updated_at: OffsetDateTime,
	},
	Closed,
}
impl CredentialState {
	fn authenticated(pair: TokenPair) -> Self {
		Self::Authenticated { pair, updated_at: OffsetDateTime::now_utc() }
	}

	fn pair(&self) -> Result<&TokenPair, SessionError> {
		match self {
			Self::Authenticated { pair, .. } => Ok(pair),
			Self::Unauthenticated => Err(SessionError::NotAuthenticated),
			Self::Closed => Err(SessionError::Closed),
		}
	}

	fn pair_mut(&mut self) -> Result<&mut TokenPair, SessionError> {
		match self {
			Self::Authenticated { pair, updated_at } => {
				*updated_at = OffsetDateTime::now_utc();

				Ok(pair)
			},
			Self::Unauthenticated => Err(SessionError::NotAuthenticated),
			Self::Closed => Err(SessionError::Closed),
		}
	}
}

/// Thread-safe holder for one session's token pair.
#[derive(Default)]
pub struct CredentialStore(Mutex<CredentialState>);
impl CredentialStore {
	/// Creates an authenticated store holding `pair`.
	pub fn with_pair(pair: TokenPair) -> Self {
		Self(Mutex::new(CredentialState::authenticated(pair)))
	}

	/// Current access token.
	pub fn access_token(&self) -> Result<TokenSecret, SessionError> {
		Ok(self.0.lock().pair()?.access_token.clone())
	}

	/// Current refresh token.
	pub fn refresh_token(&self) -> Result<TokenSecret, SessionError> {
		Ok(self.0.lock().pair()?.refresh_token.clone())
	}

	/// Both tokens, read under one lock.
	pub fn pair(&self) -> Result<TokenPair, SessionError> {
		self.0.lock().pair().cloned()
	}

	/// Instant of the last write.
	pub fn updated_at(&self) -> Result<OffsetDateTime, SessionError> {
		match &*self.0.lock() {
			CredentialState::Authenticated { updated_at, .. } => Ok(*updated_at),
			CredentialState::Unauthenticated => Err(SessionError::NotAuthenticated),
			CredentialState::Closed => Err(SessionError::Closed),
		}
	}

	/// Replaces only the access token of an authenticated store.
	pub fn set_access_token(&self, token: TokenSecret) -> Result<(), SessionError> {
		self.0.lock().pair_mut()?.access_token = token;

		Ok(())
	}

	/// Replaces only the refresh token of an authenticated store.
	pub fn set_refresh_token(&self, token: TokenSecret) -> Result<(), SessionError> {
		self.0.lock().pair_mut()?.refresh_token = token;

		Ok(())
	}

	/// Stores `pair`, authenticating the store if needed.
	pub fn replace(&self, pair: TokenPair) -> Result<(), SessionError> {
		let mut state = self.0.lock();

		if matches!(*state, CredentialState::Closed) {
			return Err(SessionError::Closed);
		}

		*state = CredentialState::authenticated(pair);

		Ok(())
	}

	/// Stores `pair` only if the current refresh token still equals `expected_refresh`.
	pub fn compare_and_swap(
		&self,
		expected_refresh: &TokenSecret,
		pair: TokenPair,
	) -> Result<CompareAndSwapOutcome, SessionError> {
		let mut state = self.0.lock();
		let outcome = match &*state {
			CredentialState::Authenticated { pair: current, .. }
				if current.refresh_token == *expected_refresh =>
				CompareAndSwapOutcome::Updated,
			CredentialState::Authenticated { .. } => CompareAndSwapOutcome::RefreshMismatch,
			CredentialState::Unauthenticated => CompareAndSwapOutcome::Missing,
			CredentialState::Closed => return Err(SessionError::Closed),
		};

		if outcome == CompareAndSwapOutcome::Updated {
			*state = CredentialState::authenticated(pair);
		}

		Ok(outcome)
	}

	/// Drops the pair; returns `false` if the store was already closed.
	pub fn close(&self) -> bool {
		let mut state = self.0.lock();

		!matches!(std::mem::replace(&mut *state, CredentialState::Closed), CredentialState::Closed)
	}

	/// Current lifecycle state.
	pub fn status(&self) -> CredentialStatus {
		match &*self.0.lock() {
			CredentialState::Unauthenticated => CredentialStatus::Unauthenticated,
			CredentialState::Authenticated { .. } => CredentialStatus::Authenticated,
			CredentialState::Closed => CredentialStatus::Closed,
		}
	}
}
impl Debug for CredentialStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialStore").field("status", &self.status()).finish()
	}
}
