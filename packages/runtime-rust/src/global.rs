//! Process-wide default logger and package-level convenience functions.
//!
//! The singleton is built at most once. [`configure`] installs an explicit
//! configuration if it runs before anything else touched the logger; the
//! first use otherwise builds one from [`LoggerConfig::from_env`]. Neither
//! can replace an instance that already exists.

use std::error::Error as StdError;
use std::fmt;
use std::sync::OnceLock;

use aloig_core::{Context, Level, Logger, FLUSH_TIMEOUT};

use crate::config::LoggerConfig;
use crate::factory::build_logger;

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// Errors from [`configure`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigureError {
    #[error("the global logger is already initialized")]
    AlreadyInitialized,
}

/// Returns the process-wide logger, building it from the environment on first use.
pub fn logger() -> &'static Logger {
    LOGGER.get_or_init(|| build_logger(&LoggerConfig::from_env()))
}

/// Installs a logger built from `config` as the process-wide instance.
///
/// # Errors
///
/// Returns [`ConfigureError::AlreadyInitialized`] if the singleton exists,
/// whether from an earlier `configure` or from lazy initialization.
pub fn configure(config: &LoggerConfig) -> Result<(), ConfigureError> {
    install(|| build_logger(config))
}

/// Installs an already-built logger as the process-wide instance.
///
/// # Errors
///
/// Returns [`ConfigureError::AlreadyInitialized`] if the singleton exists.
pub fn set_logger(logger: Logger) -> Result<(), ConfigureError> {
    install(move || logger)
}

/// Whether the singleton has been built.
pub fn is_initialized() -> bool {
    LOGGER.get().is_some()
}

fn install(build: impl FnOnce() -> Logger) -> Result<(), ConfigureError> {
    let mut installed = false;
    LOGGER.get_or_init(|| {
        installed = true;
        build()
    });
    if installed {
        Ok(())
    } else {
        Err(ConfigureError::AlreadyInitialized)
    }
}

macro_rules! delegate {
    ($($name:ident, $name_ctx:ident;)*) => {
        $(
            #[doc = concat!("[`Logger::", stringify!($name), "`] on the global logger.")]
            #[track_caller]
            pub fn $name(msg: impl fmt::Display) {
                logger().$name(msg);
            }

            #[doc = concat!("[`Logger::", stringify!($name_ctx), "`] on the global logger.")]
            #[track_caller]
            pub fn $name_ctx<'a>(ctx: impl Into<Option<&'a Context>>, msg: impl fmt::Display) {
                logger().$name_ctx(ctx, msg);
            }
        )*
    };
}

delegate! {
    trace, trace_ctx;
    debug, debug_ctx;
    info, info_ctx;
    warn, warn_ctx;
    error, error_ctx;
    fatal, fatal_ctx;
    panic, panic_ctx;
    print, print_ctx;
    warning, warning_ctx;
}

#[track_caller]
pub fn log(level: Level, msg: impl fmt::Display) {
    logger().log(level, msg);
}

#[track_caller]
pub fn log_ctx<'a>(ctx: impl Into<Option<&'a Context>>, level: Level, msg: impl fmt::Display) {
    logger().log_ctx(ctx, level, msg);
}

#[must_use]
pub fn with_field(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Logger {
    logger().with_field(key, value)
}

#[must_use]
pub fn with_fields<I, K, V>(fields: I) -> Logger
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<serde_json::Value>,
{
    logger().with_fields(fields)
}

#[must_use]
pub fn with_error<E>(err: &E) -> Logger
where
    E: StdError + ?Sized,
{
    logger().with_error(err)
}

#[must_use]
pub fn with_context(ctx: &Context) -> Logger {
    logger().with_context(ctx)
}

/// Drains pending error reports, waiting at most two seconds.
///
/// Call once before the process exits.
pub fn flush() -> bool {
    logger().flush(FLUSH_TIMEOUT)
}
