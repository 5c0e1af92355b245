// self
use crate::{_prelude::*, obs::FlowOutcome};

/// Records a driver outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(cause: Cause, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_redirect_flow_total",
			"flow" => cause.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (cause, outcome);
	}
}

/// Records success or failure for a finished driver call.
pub fn record_flow_result<T>(cause: Cause, result: &Result<T>) {
	let outcome = match result {
		Ok(_) => FlowOutcome::Success,
		Err(e) => {
			tracing::debug!(flow = cause.as_str(), error = %e, "Driver failed.");

			FlowOutcome::Failure
		},
	};

	record_flow_outcome(cause, outcome);
}
