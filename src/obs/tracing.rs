// self
use crate::{_prelude::*, http::Method, obs::RefreshTrigger, quota::QuotaDescriptor};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type Instrumented<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type Instrumented<F> = F;

/// Span wrapper used by the executor and the refresh coordinator.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Span for one executed call, tagged with its method and quota.
	pub fn request(method: &Method, quota: &QuotaDescriptor) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"mangadex_core.request",
				method = %method,
				quota = %quota,
				status = tracing::field::Empty
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (method, quota);

			Self {}
		}
	}

	/// Span for one refresh cycle.
	pub fn refresh(trigger: RefreshTrigger) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("mangadex_core.refresh", trigger = trigger.as_str());

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = trigger;

			Self {}
		}
	}

	/// Records the upstream status on the span once a response arrived.
	pub fn record_status(&self, status: u16) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("status", status);
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = status;
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Reports a background refresh failure; the timer keeps running afterwards.
pub fn refresh_failed(trigger: RefreshTrigger, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			trigger = trigger.as_str(),
			kind = error.kind(),
			status = error.status(),
			error = %error,
			"Credential refresh failed."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (trigger, error);
	}
}
