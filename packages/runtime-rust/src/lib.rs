//! `aloig` — structured logging with correlation-context propagation.
//!
//! Re-exports the backend-agnostic core ([`Context`], [`Logger`], ...) and
//! adds the production pieces: environment configuration, the `tracing`
//! backend, error reporting, the process-wide logger, and HTTP middleware.

pub mod backend;
pub mod config;
pub mod factory;
pub mod format;
pub mod global;
pub mod http;
pub mod reporter;
pub mod subscriber;

pub use aloig_core::{
    bind, ensure_trace_id, extract, generate_trace_id, read, Context, CorrelationFields,
    CorrelationKey, ErrorInfo, ExitHandler, Fields, Level, LogBackend, Logger, MemoryBackend,
    ParseLevelError, Record, UnknownKeyError, FATAL_EXIT_CODE, FLUSH_TIMEOUT, FORMAT_ERROR_MARKER,
};

pub use backend::TracingBackend;
pub use config::{is_error_reporting_env, level_from_env, LogFormat, LoggerConfig};
pub use factory::build_logger;
pub use format::FlatJsonFormat;
pub use global::{configure, logger, set_logger, ConfigureError};
pub use reporter::{ErrorReporter, ReporterSettings, SentryReporter};
pub use subscriber::{init_subscriber, InitError};
