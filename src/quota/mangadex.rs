//! Compiled-in MangaDex quota table.

// self
use crate::{
	_prelude::*,
	http::Method,
	quota::{FALLBACK_PATTERN, QuotaDescriptor},
};

/// Production API root.
pub const MANGADEX_API_BASE: &str = "https://api.mangadex.org";
/// Permits per second on the shared fallback gate.
///
/// Every uncatalogued endpoint shares this gate, so it stays at the documented global limit.
pub const MANGADEX_FALLBACK_PERMITS: usize = 5;

const SECOND: Duration = Duration::from_secs(1);
const MINUTE: Duration = Duration::from_secs(60);
const TEN_MINUTES: Duration = Duration::from_secs(10 * 60);
const HOUR: Duration = Duration::from_secs(60 * 60);

pub(super) fn entries() -> Vec<QuotaDescriptor> {
	[
		(Method::POST, "/auth/login", 30, HOUR),
		(Method::POST, "/auth/refresh", 60, HOUR),
		(Method::POST, "/account/create", 5, HOUR),
		(Method::POST, "/account/activate/resend", 5, HOUR),
		(Method::POST, "/account/recover", 5, HOUR),
		(Method::POST, "/chapter/{id}/read", 300, TEN_MINUTES),
		(Method::PUT, "/chapter/{id}", 10, MINUTE),
		(Method::DELETE, "/chapter/{id}", 10, MINUTE),
		(Method::POST, "/manga", 10, HOUR),
		(Method::PUT, "/manga/{id}", 10, MINUTE),
		(Method::DELETE, "/manga/{id}", 10, TEN_MINUTES),
		(Method::POST, "/cover/{id}", 100, TEN_MINUTES),
		(Method::POST, "/group", 10, HOUR),
		(Method::PUT, "/group/{id}", 10, MINUTE),
		(Method::DELETE, "/group/{id}", 10, TEN_MINUTES),
		(Method::POST, "/author", 10, HOUR),
		(Method::PUT, "/author/{id}", 10, MINUTE),
		(Method::DELETE, "/author/{id}", 10, TEN_MINUTES),
		(Method::POST, "/captcha/solve", 10, TEN_MINUTES),
		(Method::POST, "/report", 10, MINUTE),
		(Method::POST, "/upload/begin", 30, MINUTE),
		(Method::POST, "/upload/begin/{id}", 30, MINUTE),
		(Method::POST, "/upload/{id}/commit", 10, MINUTE),
		(Method::DELETE, "/upload/{id}", 30, MINUTE),
		(Method::POST, "/upload/{id}", 250, MINUTE),
		(Method::GET, "/at-home/server/{id}", 40, MINUTE),
		(Method::GET, "/manga/random", 60, MINUTE),
	]
	.into_iter()
	.map(|(method, pattern, permits, window)| {
		QuotaDescriptor::unchecked(Some(method), pattern, permits, window)
	})
	.collect()
}

pub(super) fn fallback() -> QuotaDescriptor {
	QuotaDescriptor::unchecked(None, FALLBACK_PATTERN, MANGADEX_FALLBACK_PERMITS, SECOND)
}
