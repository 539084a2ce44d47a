//! Observability hooks shared by gateway flows.
//!
//! Spans compile down to no-ops unless the `tracing` feature is enabled, so
//! bindings can instrument every flow without forcing the dependency on
//! callers.

// self
use crate::_prelude::*;

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Logical flow stages a span can be tagged with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowKind {
	/// Building a provider authorization URL.
	Authorize,
	/// Completing a handshake after the provider redirect.
	Finalize,
	/// Dispatching an authenticated API call.
	Dispatch,
}
impl FlowKind {
	/// Stable lowercase label used in span fields.
	pub fn as_str(self) -> &'static str {
		match self {
			FlowKind::Authorize => "authorize",
			FlowKind::Finalize => "finalize",
			FlowKind::Dispatch => "dispatch",
		}
	}
}

/// A span builder used by gateway flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the flow kind and provider.
	pub fn new(kind: FlowKind, provider: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("cloud_oauth_gateway.flow", flow = kind.as_str(), provider);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, provider);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
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

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_passes_values_through() {
		let span = FlowSpan::new(FlowKind::Dispatch, "slack");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
