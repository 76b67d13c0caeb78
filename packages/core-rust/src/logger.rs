//! The `Logger` value type.
//!
//! A [`Logger`] is immutable once built. Every `with_*` call returns a new
//! logger sharing the backend and copying only what it changes, so a logger
//! can be handed to any number of threads and derived freely without locks.

use std::error::Error as StdError;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::LogBackend;
use crate::context::Context;
use crate::fields::{extract, merge_correlation, Fields};
use crate::level::Level;
use crate::record::{ErrorInfo, Record};

/// Upper bound on how long `fatal` waits for queued records to drain.
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Appended to a message whose `Display` impl reported a formatting error.
pub const FORMAT_ERROR_MARKER: &str = "%!(FORMAT_ERROR)";

/// Exit status used by `fatal`.
pub const FATAL_EXIT_CODE: i32 = 1;

/// Called by `fatal` after the record is flushed. Defaults to `std::process::exit`.
pub type ExitHandler = Arc<dyn Fn(i32) + Send + Sync>;

/// Structured logger bound to a [`LogBackend`].
#[derive(Clone)]
pub struct Logger {
    backend: Arc<dyn LogBackend>,
    min_level: Level,
    report_caller: bool,
    fields: Arc<Fields>,
    error: Option<Arc<ErrorInfo>>,
    context: Option<Context>,
    exit: ExitHandler,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.min_level)
            .field("report_caller", &self.report_caller)
            .field("fields", &self.fields)
            .field("error", &self.error)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

macro_rules! leveled {
    ($($name:ident, $name_ctx:ident => $level:expr;)*) => {
        $(
            #[doc = concat!("Emits `msg` at `", stringify!($name), "` level.")]
            #[track_caller]
            pub fn $name(&self, msg: impl fmt::Display) {
                self.dispatch($level, None, &msg);
            }

            #[doc = concat!(
                "Emits `msg` at `", stringify!($name),
                "` level with the correlation fields of `ctx` attached."
            )]
            #[track_caller]
            pub fn $name_ctx<'a>(&self, ctx: impl Into<Option<&'a Context>>, msg: impl fmt::Display) {
                self.dispatch($level, ctx.into(), &msg);
            }
        )*
    };
}

impl Logger {
    /// Creates a logger at `Info` level with caller reporting enabled.
    #[must_use]
    pub fn new(backend: Arc<dyn LogBackend>) -> Self {
        Self {
            backend,
            min_level: Level::Info,
            report_caller: true,
            fields: Arc::new(Fields::new()),
            error: None,
            context: None,
            exit: Arc::new(process_exit),
        }
    }

    #[must_use]
    pub fn with_min_level(&self, level: Level) -> Self {
        Self {
            min_level: level,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_report_caller(&self, report_caller: bool) -> Self {
        Self {
            report_caller,
            ..self.clone()
        }
    }

    /// Replaces what `fatal` does after flushing.
    #[must_use]
    pub fn with_exit_handler(&self, handler: impl Fn(i32) + Send + Sync + 'static) -> Self {
        Self {
            exit: Arc::new(handler),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn min_level(&self) -> Level {
        self.min_level
    }

    #[must_use]
    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    #[must_use]
    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Returns a logger that adds `key = value` to every record.
    #[must_use]
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        let mut fields = Arc::clone(&self.fields);
        Arc::make_mut(&mut fields).insert(key.into(), value.into());
        Self {
            fields,
            ..self.clone()
        }
    }

    /// Returns a logger that adds every pair of `fields` to every record.
    #[must_use]
    pub fn with_fields<I, K, V>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        let mut merged = Arc::clone(&self.fields);
        let map = Arc::make_mut(&mut merged);
        for (key, value) in fields {
            map.insert(key.into(), value.into());
        }
        Self {
            fields: merged,
            ..self.clone()
        }
    }

    /// Returns a logger that attaches `err` to every record.
    #[must_use]
    pub fn with_error<E>(&self, err: &E) -> Self
    where
        E: StdError + ?Sized,
    {
        Self {
            error: Some(Arc::new(ErrorInfo::new(err))),
            ..self.clone()
        }
    }

    /// Returns a logger bound to `ctx`.
    ///
    /// The handle's correlation fields are read when each record is built and
    /// attached to every record of the returned logger, from the plain leveled
    /// calls as well as the `_ctx` variants. A handle passed to a `_ctx` call
    /// is applied after the bound one and wins key by key.
    #[must_use]
    pub fn with_context(&self, ctx: &Context) -> Self {
        Self {
            context: Some(ctx.clone()),
            ..self.clone()
        }
    }

    /// Emits `msg` at `level`.
    #[track_caller]
    pub fn log(&self, level: Level, msg: impl fmt::Display) {
        self.dispatch(level, None, &msg);
    }

    /// Emits `msg` at `level` with the correlation fields of `ctx` attached.
    #[track_caller]
    pub fn log_ctx<'a>(
        &self,
        ctx: impl Into<Option<&'a Context>>,
        level: Level,
        msg: impl fmt::Display,
    ) {
        self.dispatch(level, ctx.into(), &msg);
    }

    leveled! {
        trace, trace_ctx => Level::Trace;
        debug, debug_ctx => Level::Debug;
        info, info_ctx => Level::Info;
        warn, warn_ctx => Level::Warn;
        error, error_ctx => Level::Error;
        fatal, fatal_ctx => Level::Fatal;
        panic, panic_ctx => Level::Panic;
    }

    /// Alias of [`Logger::info`].
    #[track_caller]
    pub fn print(&self, msg: impl fmt::Display) {
        self.dispatch(Level::Info, None, &msg);
    }

    /// Alias of [`Logger::info_ctx`].
    #[track_caller]
    pub fn print_ctx<'a>(&self, ctx: impl Into<Option<&'a Context>>, msg: impl fmt::Display) {
        self.dispatch(Level::Info, ctx.into(), &msg);
    }

    /// Alias of [`Logger::warn`].
    #[track_caller]
    pub fn warning(&self, msg: impl fmt::Display) {
        self.dispatch(Level::Warn, None, &msg);
    }

    /// Alias of [`Logger::warn_ctx`].
    #[track_caller]
    pub fn warning_ctx<'a>(&self, ctx: impl Into<Option<&'a Context>>, msg: impl fmt::Display) {
        self.dispatch(Level::Warn, ctx.into(), &msg);
    }

    /// Drains the backend, waiting at most `timeout`.
    pub fn flush(&self, timeout: Duration) -> bool {
        self.backend.flush(timeout)
    }

    #[track_caller]
    fn dispatch(&self, level: Level, ctx: Option<&Context>, msg: &dyn fmt::Display) {
        let enabled = self.is_enabled(level);
        if !enabled && level < Level::Fatal {
            return;
        }

        let message = render(msg);
        if enabled {
            let record = self.build_record(level, ctx, message.clone(), Location::caller());
            self.backend.emit(&record);
        }

        match level {
            Level::Fatal => {
                self.backend.flush(FLUSH_TIMEOUT);
                (self.exit)(FATAL_EXIT_CODE);
            }
            Level::Panic => panic!("{message}"),
            _ => {}
        }
    }

    fn build_record(
        &self,
        level: Level,
        ctx: Option<&Context>,
        message: String,
        caller: &Location<'_>,
    ) -> Record {
        let mut fields = (*self.fields).clone();
        if let Some(bound) = &self.context {
            merge_correlation(&mut fields, extract(bound));
        }
        if let Some(ctx) = ctx {
            merge_correlation(&mut fields, extract(ctx));
        }

        Record {
            level,
            message,
            fields,
            error: self.error.as_deref().cloned(),
            caller: self
                .report_caller
                .then(|| format!("{}:{}", caller.file(), caller.line())),
        }
    }
}

fn process_exit(code: i32) {
    std::process::exit(code)
}

/// Renders `msg`, marking rather than propagating a formatting failure.
fn render(msg: &dyn fmt::Display) -> String {
    let mut out = String::new();
    if fmt::write(&mut out, format_args!("{msg}")).is_err() {
        out.push_str(FORMAT_ERROR_MARKER);
    }
    out
}
