// crates.io
use tracing::{Instrument, Span, instrument::Instrumented, span::EnteredSpan};
// self
use crate::_prelude::*;

/// Span wrapper used by session drivers.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	span: Span,
}
impl FlowSpan {
	/// Creates a span tagged with the driver's cause label and the call-site stage.
	pub fn new(cause: Cause, stage: &'static str) -> Self {
		Self { span: tracing::info_span!("oauth2_redirect.flow", flow = cause.as_str(), stage) }
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> EnteredSpan {
		self.span.entered()
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn entered_span_guards_synchronous_sections() {
		let _guard = FlowSpan::new(Cause::RecoverState, "test").entered();
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = FlowSpan::new(Cause::Discovery, "instrument_wraps_future");
		let value = FlowSpan::instrument(&span, async { 42 }).await;

		assert_eq!(value, 42);
	}
}
