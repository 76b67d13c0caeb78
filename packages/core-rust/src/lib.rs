//! `aloig` Core — correlation context, structured fields, levels, and the `Logger` value type.

pub mod backend;
pub mod context;
pub mod fields;
pub mod level;
pub mod logger;
pub mod record;

pub use backend::{LogBackend, MemoryBackend};
pub use context::{
    bind, ensure_trace_id, generate_trace_id, read, Context, CorrelationKey, UnknownKeyError,
};
pub use fields::{extract, CorrelationFields, Fields};
pub use level::{Level, ParseLevelError};
pub use logger::{ExitHandler, Logger, FATAL_EXIT_CODE, FLUSH_TIMEOUT, FORMAT_ERROR_MARKER};
pub use record::{ErrorInfo, Record};
