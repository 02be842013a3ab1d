//! Delayed-release rate gates, one per quota.
//!
//! Each gate is a counting semaphore sized to the quota's permit count. A permit is held for
//! the duration of a call and, once the call finishes, handed to a runtime task that keeps it
//! for one more window before returning it. That approximates "at most N calls per window"
//! with a single primitive: it slightly under-admits at window boundaries, because reuse is
//! measured from the end of the previous call rather than its start.

// crates.io
use tokio::{
	runtime::Handle,
	sync::{OwnedSemaphorePermit, Semaphore},
};
// self
use crate::{
	_prelude::*,
	quota::{QuotaCatalog, QuotaDescriptor, QuotaKey},
};

#[derive(Debug, Default)]
struct Gates {
	map: HashMap<QuotaKey, Arc<Semaphore>>,
	shut_down: bool,
}

/// Per-quota admission control shared by every executor clone.
#[derive(Debug, Default)]
pub struct RateLimiter {
	gates: Mutex<Gates>,
}
impl RateLimiter {
	/// Creates gates for every catalog entry and the fallback up front.
	pub fn new(catalog: &QuotaCatalog) -> Self {
		let map = catalog
			.entries()
			.iter()
			.chain([catalog.fallback()])
			.map(|quota| (quota.key().clone(), Arc::new(Semaphore::new(quota.permits()))))
			.collect();

		Self { gates: Mutex::new(Gates { map, shut_down: false }) }
	}

	/// Waits for a permit on `quota`'s gate.
	///
	/// Dropping the returned future abandons the wait without taking a permit. If the limiter
	/// is shut down before or during the wait, the call fails with [`Error::Interrupted`].
	pub async fn acquire(&self, quota: &QuotaDescriptor) -> Result<GatePermit> {
		let gate = self.gate(quota);
		let permit = gate
			.acquire_owned()
			.await
			.map_err(|_| Error::Interrupted { quota: quota.to_string() })?;

		Ok(GatePermit {
			permit: Some(permit),
			window: quota.window(),
			runtime: Handle::current(),
		})
	}

	/// Hands `permit` back; it becomes reusable one window from now.
	///
	/// Equivalent to dropping the permit.
	pub fn release(permit: GatePermit) {
		drop(permit);
	}

	/// Permits currently available on `quota`'s gate.
	pub fn available_permits(&self, quota: &QuotaDescriptor) -> usize {
		self.gate(quota).available_permits()
	}

	/// Stops admission: pending and future acquisitions fail with [`Error::Interrupted`].
	///
	/// Permits already handed out stay valid; calls in flight are not aborted.
	pub fn shutdown(&self) {
		let mut gates = self.gates.lock();

		gates.shut_down = true;

		for gate in gates.map.values() {
			gate.close();
		}
	}

	/// Whether [`shutdown`](Self::shutdown) has been called.
	pub fn is_shut_down(&self) -> bool {
		self.gates.lock().shut_down
	}

	fn gate(&self, quota: &QuotaDescriptor) -> Arc<Semaphore> {
		let mut gates = self.gates.lock();
		let shut_down = gates.shut_down;

		gates
			.map
			.entry(quota.key().clone())
			.or_insert_with(|| {
				let gate = Semaphore::new(quota.permits());

				if shut_down {
					gate.close();
				}

				Arc::new(gate)
			})
			.clone()
	}
}

/// Scoped admission for one call.
///
/// Dropping the permit, on any exit path, schedules its return to the gate after the quota's
/// window on the runtime it was acquired on.
#[must_use = "dropping the permit immediately starts its cooldown"]
pub struct GatePermit {
	permit: Option<OwnedSemaphorePermit>,
	window: Duration,
	runtime: Handle,
}
impl GatePermit {
	/// Cooldown applied once the permit is released.
	pub fn window(&self) -> Duration {
		self.window
	}
}
impl Debug for GatePermit {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GatePermit").field("window", &self.window).finish()
	}
}
impl Drop for GatePermit {
	fn drop(&mut self) {
		let Some(permit) = self.permit.take() else {
			return;
		};
		let window = self.window;

		// A runtime that is shutting down drops the task, and the permit with it.
		self.runtime.spawn(async move {
			tokio::time::sleep(window).await;
			drop(permit);
		});
	}
}
