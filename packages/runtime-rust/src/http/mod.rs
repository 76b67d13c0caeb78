//! HTTP boundary: correlation middleware for inbound requests.

pub mod correlation;
pub mod middleware;

pub use correlation::{
    context_from_headers, CorrelationLayer, CorrelationService, TRACE_ID_HEADER, USER_ID_HEADER,
};
pub use middleware::{build_http_layers, CorrelationSpan};
