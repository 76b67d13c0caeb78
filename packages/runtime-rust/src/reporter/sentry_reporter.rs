//! Error reporter backed by the Sentry SDK.
//!
//! The SDK client owns delivery: events are queued on its transport thread
//! and [`ErrorReporter::flush`] waits for that queue to drain.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use aloig_core::{Level, Record};
use sentry::protocol::{Event, Exception, User, Value};
use sentry::types::{Dsn, ParseDsnError};
use sentry::ClientOptions;

use super::ErrorReporter;

/// Logger name stamped on every event.
const LOGGER_NAME: &str = "aloig";

/// Correlation ids promoted from `extra` to searchable tags.
const TAGGED_FIELDS: [&str; 3] = ["trace_id", "request_id", "session_id"];

/// Errors from building a [`SentryReporter`].
#[derive(Debug, thiserror::Error)]
pub enum ReporterError {
    #[error("invalid DSN: {0}")]
    Dsn(#[from] ParseDsnError),
}

/// Static attributes of every reported event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReporterSettings {
    pub environment: String,
    pub release: String,
    pub server_name: String,
    pub traces_sample_rate: f64,
    /// Extra tags, e.g. the application name.
    pub tags: BTreeMap<String, String>,
}

/// Reporter sending error records through a Sentry client.
pub struct SentryReporter {
    client: Arc<sentry::Client>,
    settings: ReporterSettings,
}

impl std::fmt::Debug for SentryReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentryReporter")
            .field("settings", &self.settings)
            .field("enabled", &self.client.is_enabled())
            .finish_non_exhaustive()
    }
}

impl SentryReporter {
    /// Validates `dsn` and builds a client with the default transport.
    ///
    /// # Errors
    ///
    /// Returns [`ReporterError::Dsn`] when `dsn` does not parse.
    pub fn new(dsn: &str, settings: ReporterSettings) -> Result<Self, ReporterError> {
        let dsn: Dsn = dsn.trim().parse()?;

        #[allow(clippy::cast_possible_truncation)]
        let traces_sample_rate = settings.traces_sample_rate as f32;
        let options = sentry::apply_defaults(ClientOptions {
            dsn: Some(dsn),
            environment: non_empty(&settings.environment),
            release: non_empty(&settings.release),
            server_name: non_empty(&settings.server_name),
            traces_sample_rate,
            ..ClientOptions::default()
        });

        Ok(Self {
            client: Arc::new(sentry::Client::from(options)),
            settings,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &ReporterSettings {
        &self.settings
    }
}

impl ErrorReporter for SentryReporter {
    fn report(&self, record: &Record) {
        self.client
            .capture_event(event_from_record(record, &self.settings), None);
    }

    fn flush(&self, timeout: Duration) -> bool {
        self.client.flush(Some(timeout))
    }
}

fn non_empty(value: &str) -> Option<Cow<'static, str>> {
    (!value.is_empty()).then(|| Cow::Owned(value.to_string()))
}

fn sentry_level(level: Level) -> sentry::Level {
    match level {
        Level::Trace | Level::Debug => sentry::Level::Debug,
        Level::Info => sentry::Level::Info,
        Level::Warn => sentry::Level::Warning,
        Level::Error => sentry::Level::Error,
        Level::Fatal | Level::Panic => sentry::Level::Fatal,
    }
}

fn event_from_record(record: &Record, settings: &ReporterSettings) -> Event<'static> {
    let mut tags = settings.tags.clone();
    for key in TAGGED_FIELDS {
        if let Some(value) = record.field_str(key) {
            tags.insert(key.to_string(), value.to_string());
        }
    }

    let mut extra: BTreeMap<String, Value> = record.fields.clone().into_iter().collect();
    if let Some(caller) = &record.caller {
        extra.insert("caller".to_string(), Value::from(caller.as_str()));
    }

    // Innermost cause first, the attached error last.
    let exception = record
        .error
        .as_ref()
        .map(|err| {
            let mut values: Vec<Exception> = err
                .chain
                .iter()
                .rev()
                .map(|cause| Exception {
                    ty: "cause".to_string(),
                    value: Some(cause.clone()),
                    ..Exception::default()
                })
                .collect();
            values.push(Exception {
                ty: err.kind.clone(),
                value: Some(err.message.clone()),
                ..Exception::default()
            });
            values
        })
        .unwrap_or_default();

    Event {
        level: sentry_level(record.level),
        message: Some(record.message.clone()),
        logger: Some(LOGGER_NAME.to_string()),
        tags,
        extra,
        user: record.field_str("user_id").map(|id| User {
            id: Some(id.to_string()),
            ..User::default()
        }),
        exception: exception.into(),
        ..Event::default()
    }
}
