//! Tower middleware that seeds a correlation [`Context`] for every request.
//!
//! The context is stored in the request extensions, where handlers pick it
//! up (with axum, via `Extension<Context>`). The resolved trace id is echoed
//! on the response.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use aloig_core::{generate_trace_id, Context};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Request, Response};
use tower::{Layer, Service};

/// Inbound and outbound trace id header.
pub const TRACE_ID_HEADER: HeaderName = HeaderName::from_static("x-trace-id");

/// Inbound user id header.
pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");

/// Builds the correlation context for a request with `headers`.
///
/// The trace id is taken from `X-Trace-ID` or generated, `X-User-ID` is bound
/// when present, and a fresh request id is always bound.
#[must_use]
pub fn context_from_headers(headers: &HeaderMap) -> Context {
    let header = |name: &HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .unwrap_or_default()
    };

    let mut ctx = Context::new();
    let trace_id = header(&TRACE_ID_HEADER);
    if !trace_id.is_empty() {
        ctx = ctx.with_trace_id(trace_id);
    }
    let (mut ctx, _) = ctx.ensure_trace_id();

    let user_id = header(&USER_ID_HEADER);
    if !user_id.is_empty() {
        ctx = ctx.with_user_id(user_id);
    }
    ctx.with_request_id(generate_trace_id())
}

// ---------------------------------------------------------------------------
// CorrelationLayer
// ---------------------------------------------------------------------------

/// Tower layer installing [`CorrelationService`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationLayer;

impl CorrelationLayer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for CorrelationLayer {
    type Service = CorrelationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationService { inner }
    }
}

// ---------------------------------------------------------------------------
// CorrelationService
// ---------------------------------------------------------------------------

/// Service wrapper that attaches a [`Context`] to each request and echoes the
/// trace id on the response.
#[derive(Debug, Clone)]
pub struct CorrelationService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CorrelationService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: 'static,
    ResBody: 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response<ResBody>, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        let ctx = context_from_headers(request.headers());
        let echoed = HeaderValue::from_str(ctx.trace_id()).ok();
        request.extensions_mut().insert(ctx);

        let fut = self.inner.call(request);
        Box::pin(async move {
            let mut response = fut.await?;
            if let Some(value) = echoed {
                response.headers_mut().insert(TRACE_ID_HEADER, value);
            }
            Ok(response)
        })
    }
}
