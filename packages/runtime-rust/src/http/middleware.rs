//! HTTP middleware stack for correlated request logging.
//!
//! Middleware ordering follows the outer-to-inner convention: the first
//! layer listed is the outermost (processes the request first on the way
//! in, and the response last on the way out).

use aloig_core::Context;
use http::Request;
use tower::ServiceBuilder;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{MakeSpan, TraceLayer};
use tracing::Span;

use super::correlation::CorrelationLayer;

/// The composed Tower layer type produced by [`build_http_layers`].
type HttpLayers = tower::layer::util::Stack<
    TraceLayer<SharedClassifier<ServerErrorsAsFailures>, CorrelationSpan>,
    tower::layer::util::Stack<CorrelationLayer, tower::layer::util::Identity>,
>;

/// Request span carrying the correlation ids set by [`CorrelationLayer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationSpan;

impl<B> MakeSpan<B> for CorrelationSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let ctx = request.extensions().get::<Context>();
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            trace_id = ctx.map(Context::trace_id),
            request_id = ctx.map(Context::request_id),
        )
    }
}

/// Builds the HTTP-level Tower middleware stack.
///
/// **Middleware ordering (outermost to innermost):**
/// 1. `Correlation` -- resolves trace, request and user ids into a [`Context`]
///    request extension and echoes `X-Trace-ID` on the response
/// 2. `Tracing` -- request/response span tagged with the trace and request ids
#[must_use]
pub fn build_http_layers() -> HttpLayers {
    ServiceBuilder::new()
        .layer(CorrelationLayer::new())
        .layer(TraceLayer::new_for_http().make_span_with(CorrelationSpan))
        .into_inner()
}
