//! Error reporting: forwards error, fatal and panic records to an external
//! error-tracking service.
//!
//! [`SentryReporter`] is the production implementation, built on the Sentry SDK.

pub mod sentry_reporter;

use std::time::Duration;

use aloig_core::Record;

pub use sentry_reporter::{ReporterError, ReporterSettings, SentryReporter};

/// Destination for error-level records.
///
/// `report` is fire-and-forget; delivery happens in the background and is
/// only awaited by `flush`.
pub trait ErrorReporter: Send + Sync {
    /// Queues `record` for delivery.
    fn report(&self, record: &Record);

    /// Waits up to `timeout` for queued records to be delivered.
    ///
    /// Returns `true` if the queue drained in time.
    fn flush(&self, timeout: Duration) -> bool;
}
