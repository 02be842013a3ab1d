//! Background refresh loop.

// crates.io
use tokio::{
	sync::watch,
	task::JoinHandle,
	time::{self, Instant, MissedTickBehavior},
};
// self
use crate::{_prelude::*, obs::RefreshTrigger};

/// How [`Session::close`](crate::session::Session::close) stopped the refresh timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseOutcome {
	/// The timer stopped within the grace period (or none was running).
	Drained,
	/// An in-flight refresh outlived the grace period and was aborted.
	Aborted,
	/// The session had already been closed.
	AlreadyClosed,
}

/// Handle to a running refresh loop.
#[derive(Debug)]
pub(crate) struct RefreshTimer {
	shutdown: watch::Sender<bool>,
	handle: JoinHandle<()>,
}
impl RefreshTimer {
	/// Spawns a loop that calls `cycle` every `period`, first one `period` from now.
	///
	/// A cycle that overruns pushes the next tick back instead of bursting to catch up.
	pub(crate) fn spawn<F, Fut>(period: Duration, mut cycle: F) -> Self
	where
		F: 'static + Send + FnMut(RefreshTrigger) -> Fut,
		Fut: 'static + Send + Future<Output = ()>,
	{
		let (shutdown, mut signal) = watch::channel(false);
		let handle = tokio::spawn(async move {
			let mut ticker = time::interval_at(Instant::now() + period, period);

			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

			loop {
				tokio::select! {
					biased;
					_ = signal.changed() => break,
					_ = ticker.tick() => cycle(RefreshTrigger::Timer).await,
				}
			}
		});

		Self { shutdown, handle }
	}

	/// Signals the loop and waits up to `grace` for the current cycle to finish.
	pub(crate) async fn stop(self, grace: Duration) -> CloseOutcome {
		let _ = self.shutdown.send(true);
		let abort = self.handle.abort_handle();

		match time::timeout(grace, self.handle).await {
			Ok(_) => CloseOutcome::Drained,
			Err(_) => {
				abort.abort();

				CloseOutcome::Aborted
			},
		}
	}

	pub(crate) fn abort(&self) {
		self.handle.abort();
	}
}
