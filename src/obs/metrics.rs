// self
use crate::{
	obs::{RefreshOutcome, RefreshTrigger},
	quota::QuotaDescriptor,
};

/// Records a finished call via the global metrics recorder (when enabled).
pub fn record_request_outcome(quota: &QuotaDescriptor, outcome: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"mangadex_core_request_total",
			"quota" => quota.to_string(),
			"outcome" => outcome
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (quota, outcome);
	}
}

/// Records a refresh outcome via the global metrics recorder (when enabled).
pub fn record_refresh_outcome(trigger: RefreshTrigger, outcome: RefreshOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"mangadex_core_refresh_total",
			"trigger" => trigger.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (trigger, outcome);
	}
}
