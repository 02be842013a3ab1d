// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-session refresh counters.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	rotations: AtomicU64,
	reuses: AtomicU64,
	failures: AtomicU64,
}
impl RefreshMetrics {
	/// Refresh cycles started, by the timer or on demand.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Cycles that exchanged the refresh token for a new pair.
	pub fn rotations(&self) -> u64 {
		self.rotations.load(Ordering::Relaxed)
	}

	/// Cycles that found the pair already rotated by a concurrent refresh.
	pub fn reuses(&self) -> u64 {
		self.reuses.load(Ordering::Relaxed)
	}

	/// Cycles that failed.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_rotation(&self) {
		self.rotations.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_reuse(&self) {
		self.reuses.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
