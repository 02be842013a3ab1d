//! Optional observability hooks for the request pipeline.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to wrap every executed call in a `mangadex_core.request`
//!   span with `method` and `quota` fields, and every refresh in a `mangadex_core.refresh` span
//!   with a `trigger` field. Background refresh failures are reported as `WARN` events.
//! - Enable `metrics` to increment `mangadex_core_request_total` (labeled by `quota` + `outcome`)
//!   and `mangadex_core_refresh_total` (labeled by `trigger` + `outcome`).
//!
//! Installing a subscriber or recorder is left to the application.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// What started a credential refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshTrigger {
	/// Periodic background timer.
	Timer,
	/// Explicit [`Session::refresh_now`](crate::session::Session::refresh_now) call.
	Manual,
}
impl RefreshTrigger {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshTrigger::Timer => "timer",
			RefreshTrigger::Manual => "manual",
		}
	}
}
impl Display for RefreshTrigger {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for refresh cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshOutcome {
	/// Entry to a refresh cycle.
	Attempt,
	/// Tokens were rotated.
	Success,
	/// A concurrent refresh already rotated the tokens; its result was reused.
	Reused,
	/// Failure propagated back to the caller or logged by the timer.
	Failure,
}
impl RefreshOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshOutcome::Attempt => "attempt",
			RefreshOutcome::Success => "success",
			RefreshOutcome::Reused => "reused",
			RefreshOutcome::Failure => "failure",
		}
	}
}
impl Display for RefreshOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Label recorded for a finished call: `success` or the error's [`Error::kind`].
pub fn request_outcome_label<T>(result: &Result<T>) -> &'static str {
	match result {
		Ok(_) => "success",
		Err(err) => err.kind(),
	}
}
