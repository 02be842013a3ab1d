//! Per-endpoint quota descriptors and the classifier that maps calls onto them.
//!
//! Classification strips the API base from the target URL, replaces opaque identifiers with
//! [`ID_WILDCARD`], and compares the normalized path and method against the catalog in
//! declaration order. The first match wins, so narrower patterns must come before anything
//! that could also match them. Calls that match nothing, or that target another origin, fall
//! into the single shared fallback quota.

mod mangadex;

pub use mangadex::{MANGADEX_API_BASE, MANGADEX_FALLBACK_PERMITS};

// std
use std::collections::HashSet;
// self
use crate::{_prelude::*, http::Method};

/// Marker that stands in for an opaque identifier segment in quota patterns.
pub const ID_WILDCARD: &str = "{id}";
/// Length of an opaque identifier segment (hyphenated UUID form).
pub const OPAQUE_ID_LEN: usize = 36;

const FALLBACK_PATTERN: &str = "*";

/// Errors raised while validating descriptors or catalogs.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum QuotaError {
	/// A gate must admit at least one request.
	#[error("Quota `{quota}` must permit at least one request.")]
	ZeroPermits {
		/// Offending quota label.
		quota: String,
	},
	/// A gate must hold permits for a non-zero window.
	#[error("Quota `{quota}` must use a non-zero window.")]
	ZeroWindow {
		/// Offending quota label.
		quota: String,
	},
	/// Patterns are absolute paths.
	#[error("Quota pattern `{pattern}` must start with `/`.")]
	InvalidPattern {
		/// Offending pattern.
		pattern: String,
	},
	/// Two entries share a method and pattern.
	#[error("Quota `{quota}` is declared more than once.")]
	Duplicate {
		/// Offending quota label.
		quota: String,
	},
}

/// Identity of a rate gate: method (or any) plus pattern.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QuotaKey {
	/// Concrete method, or `None` for any method.
	pub method: Option<Method>,
	/// Normalized pattern.
	pub pattern: String,
}

/// Immutable quota: at most `permits` calls per `window` for one endpoint pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuotaDescriptor {
	key: QuotaKey,
	permits: usize,
	window: Duration,
}
impl QuotaDescriptor {
	/// Creates a validated descriptor for one method.
	pub fn new(
		method: Method,
		pattern: impl Into<String>,
		permits: usize,
		window: Duration,
	) -> Result<Self, QuotaError> {
		Self::validated(Some(method), pattern.into(), permits, window)
	}

	/// Creates a validated descriptor matching every method.
	pub fn any_method(
		pattern: impl Into<String>,
		permits: usize,
		window: Duration,
	) -> Result<Self, QuotaError> {
		Self::validated(None, pattern.into(), permits, window)
	}

	/// Creates the catch-all descriptor used when nothing in the catalog matches.
	pub fn fallback(permits: usize, window: Duration) -> Result<Self, QuotaError> {
		let descriptor = Self::unchecked(None, FALLBACK_PATTERN, permits, window);

		descriptor.validate_limits()?;

		Ok(descriptor)
	}

	pub(crate) fn unchecked(
		method: Option<Method>,
		pattern: &str,
		permits: usize,
		window: Duration,
	) -> Self {
		Self { key: QuotaKey { method, pattern: pattern.to_owned() }, permits, window }
	}

	fn validated(
		method: Option<Method>,
		pattern: String,
		permits: usize,
		window: Duration,
	) -> Result<Self, QuotaError> {
		if !pattern.starts_with('/') {
			return Err(QuotaError::InvalidPattern { pattern });
		}

		let pattern = normalize_segments(&pattern);
		let descriptor = Self { key: QuotaKey { method, pattern }, permits, window };

		descriptor.validate_limits()?;

		Ok(descriptor)
	}

	fn validate_limits(&self) -> Result<(), QuotaError> {
		if self.permits == 0 {
			return Err(QuotaError::ZeroPermits { quota: self.to_string() });
		}
		if self.window.is_zero() {
			return Err(QuotaError::ZeroWindow { quota: self.to_string() });
		}

		Ok(())
	}

	/// Gate identity.
	pub fn key(&self) -> &QuotaKey {
		&self.key
	}

	/// Concrete method, or `None` when the quota covers every method.
	pub fn method(&self) -> Option<&Method> {
		self.key.method.as_ref()
	}

	/// Normalized pattern (`*` for the fallback).
	pub fn pattern(&self) -> &str {
		&self.key.pattern
	}

	/// Maximum concurrently outstanding permits.
	pub fn permits(&self) -> usize {
		self.permits
	}

	/// Delay before a released permit becomes reusable.
	pub fn window(&self) -> Duration {
		self.window
	}

	/// Whether this is the catch-all quota.
	pub fn is_fallback(&self) -> bool {
		self.key.pattern == FALLBACK_PATTERN
	}

	fn matches(&self, method: &Method, path: &str) -> bool {
		self.key.method.as_ref().is_none_or(|m| m == method) && self.key.pattern == path
	}
}
impl Display for QuotaDescriptor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match &self.key.method {
			Some(method) => write!(f, "{method} {}", self.key.pattern),
			None => write!(f, "* {}", self.key.pattern),
		}
	}
}

/// Ordered quota catalog plus the API base it classifies against.
#[derive(Clone, Debug)]
pub struct QuotaCatalog {
	base: String,
	entries: Vec<QuotaDescriptor>,
	fallback: QuotaDescriptor,
}
impl QuotaCatalog {
	/// Creates a validated catalog; entries are matched in the given order.
	pub fn new(
		base: &str,
		entries: impl IntoIterator<Item = QuotaDescriptor>,
		fallback: QuotaDescriptor,
	) -> Result<Self, QuotaError> {
		let entries = entries.into_iter().collect::<Vec<_>>();
		let mut seen = HashSet::new();

		for entry in &entries {
			entry.validate_limits()?;

			if !seen.insert(entry.key()) {
				return Err(QuotaError::Duplicate { quota: entry.to_string() });
			}
		}

		fallback.validate_limits()?;

		Ok(Self { base: normalize_base(base), entries, fallback })
	}

	/// Compiled-in MangaDex catalog against [`MANGADEX_API_BASE`].
	pub fn mangadex() -> Self {
		Self {
			base: MANGADEX_API_BASE.to_owned(),
			entries: mangadex::entries(),
			fallback: mangadex::fallback(),
		}
	}

	/// Replaces the API base, keeping the entries.
	pub fn with_base(mut self, base: &str) -> Self {
		self.base = normalize_base(base);

		self
	}

	/// API base stripped from URLs before matching.
	pub fn base(&self) -> &str {
		&self.base
	}

	/// Catalog entries in match order.
	pub fn entries(&self) -> &[QuotaDescriptor] {
		&self.entries
	}

	/// Catch-all quota.
	pub fn fallback(&self) -> &QuotaDescriptor {
		&self.fallback
	}

	/// Returns the first entry matching `method` and `url`, else the fallback.
	pub fn classify(&self, method: &Method, url: &Url) -> &QuotaDescriptor {
		let Some(path) = self.normalize(url) else {
			return &self.fallback;
		};

		self.entries.iter().find(|entry| entry.matches(method, &path)).unwrap_or(&self.fallback)
	}

	/// Path relative to the base with identifiers replaced, or `None` for foreign URLs.
	pub fn normalize(&self, url: &Url) -> Option<String> {
		let rest = url.as_str().strip_prefix(&self.base)?;
		let path = rest.split(['?', '#']).next().unwrap_or_default();

		if !path.is_empty() && !path.starts_with('/') {
			return None;
		}

		Some(normalize_segments(path))
	}
}

/// Whether `segment` looks like an opaque identifier: 36 hex digits or hyphens, any case.
pub fn is_opaque_id(segment: &str) -> bool {
	segment.len() == OPAQUE_ID_LEN && segment.bytes().all(|b| b.is_ascii_hexdigit() || b == b'-')
}

fn normalize_segments(path: &str) -> String {
	let mut normalized = String::with_capacity(path.len());

	for segment in path.split('/').filter(|segment| !segment.is_empty()) {
		normalized.push('/');
		normalized.push_str(if is_opaque_id(segment) { ID_WILDCARD } else { segment });
	}

	if normalized.is_empty() {
		normalized.push('/');
	}

	normalized
}

// Matches `Url`'s serialization: lowercase host, default port dropped.
fn normalize_base(base: &str) -> String {
	match Url::parse(base) {
		Ok(url) => url.as_str().trim_end_matches('/').to_owned(),
		Err(_) => base.trim_end_matches('/').to_owned(),
	}
}
