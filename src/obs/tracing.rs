// self
use crate::{_prelude::*, obs::OpKind, session::SessionEndReason};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by gateway operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("bearer_gateway.op", op = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
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

pub(crate) fn refresh_led(generation: u64) {
	#[cfg(feature = "tracing")]
	tracing::debug!(generation, "leading refresh exchange");
	#[cfg(not(feature = "tracing"))]
	let _ = generation;
}

pub(crate) fn refresh_joined(generation: u64) {
	#[cfg(feature = "tracing")]
	tracing::debug!(generation, "joined settled refresh");
	#[cfg(not(feature = "tracing"))]
	let _ = generation;
}

pub(crate) fn session_ended(reason: &SessionEndReason) {
	#[cfg(feature = "tracing")]
	tracing::warn!(reason = reason.as_str(), "session ended: {reason}");
	#[cfg(not(feature = "tracing"))]
	let _ = reason;
}

pub(crate) fn store_clear_failed(err: &crate::store::StoreError) {
	#[cfg(feature = "tracing")]
	tracing::error!(error = %err, "failed to clear credential store");
	#[cfg(not(feature = "tracing"))]
	let _ = err;
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = OpSpan::new(OpKind::Refresh, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[test]
	fn event_helpers_are_callable_without_subscriber() {
		refresh_led(1);
		refresh_joined(1);
		session_ended(&SessionEndReason::SignedOut);
	}
}
