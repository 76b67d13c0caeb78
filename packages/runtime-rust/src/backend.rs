//! [`LogBackend`] that turns records into `tracing` events.
//!
//! Correlation ids become first-class event fields; every other structured
//! field is carried as one JSON-encoded `fields` value, which
//! [`FlatJsonFormat`](crate::format::FlatJsonFormat) unpacks into top-level
//! keys. Error, fatal and panic records are additionally handed to the
//! configured [`ErrorReporter`].

use std::sync::Arc;
use std::time::Duration;

use aloig_core::{CorrelationKey, Level, LogBackend, Record};

use crate::reporter::ErrorReporter;

/// Target of every event emitted by [`TracingBackend`].
pub const EVENT_TARGET: &str = "aloig";

/// Event field holding the exact [`Level`] name.
pub const SEVERITY_KEY: &str = "severity";

/// Event field holding the JSON-encoded non-correlation fields.
pub const FIELDS_KEY: &str = "fields";

// `tracing::event!` needs a constant level, so each arm repeats the call.
macro_rules! event_at {
    ($level:expr, $($rest:tt)*) => {
        match $level {
            Level::Trace => tracing::event!(target: EVENT_TARGET, tracing::Level::TRACE, $($rest)*),
            Level::Debug => tracing::event!(target: EVENT_TARGET, tracing::Level::DEBUG, $($rest)*),
            Level::Info => tracing::event!(target: EVENT_TARGET, tracing::Level::INFO, $($rest)*),
            Level::Warn => tracing::event!(target: EVENT_TARGET, tracing::Level::WARN, $($rest)*),
            Level::Error | Level::Fatal | Level::Panic => {
                tracing::event!(target: EVENT_TARGET, tracing::Level::ERROR, $($rest)*)
            }
        }
    };
}

/// Emits records through the globally installed `tracing` subscriber.
#[derive(Clone, Default)]
pub struct TracingBackend {
    reporter: Option<Arc<dyn ErrorReporter>>,
}

impl std::fmt::Debug for TracingBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracingBackend")
            .field("reporter", &self.reporter.is_some())
            .finish()
    }
}

impl TracingBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forwards error-level records to `reporter`.
    #[must_use]
    pub fn with_reporter(reporter: Arc<dyn ErrorReporter>) -> Self {
        Self {
            reporter: Some(reporter),
        }
    }

    #[must_use]
    pub fn has_reporter(&self) -> bool {
        self.reporter.is_some()
    }
}

impl LogBackend for TracingBackend {
    fn emit(&self, record: &Record) {
        let correlation = |key: CorrelationKey| record.field_str(key.as_str());
        let extra = encode_extra_fields(record);
        let error = record.error.as_ref();

        event_at!(
            record.level,
            severity = record.level.as_str(),
            trace_id = correlation(CorrelationKey::TraceId),
            request_id = correlation(CorrelationKey::RequestId),
            user_id = correlation(CorrelationKey::UserId),
            session_id = correlation(CorrelationKey::SessionId),
            fields = extra.as_deref(),
            error = error.map(|e| e.message.as_str()),
            error_kind = error.map(|e| e.kind.as_str()),
            caller = record.caller.as_deref(),
            "{}",
            record.message
        );

        if record.level.is_reportable() {
            if let Some(reporter) = &self.reporter {
                reporter.report(record);
            }
        }
    }

    fn flush(&self, timeout: Duration) -> bool {
        self.reporter
            .as_ref()
            .map_or(true, |reporter| reporter.flush(timeout))
    }
}

/// JSON object of the record's non-correlation fields, `None` when empty.
fn encode_extra_fields(record: &Record) -> Option<String> {
    let extra: serde_json::Map<String, serde_json::Value> = record
        .fields
        .iter()
        .filter(|(key, _)| key.parse::<CorrelationKey>().is_err())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    if extra.is_empty() {
        return None;
    }
    serde_json::to_string(&extra).ok()
}

#[cfg(test)]
mod tests {
    use std::io;

    use aloig_core::{ErrorInfo, Fields, Logger};
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::format::test_support::capture_json as capture;

    /// Reporter that remembers what it was given.
    #[derive(Default)]
    struct RecordingReporter {
        reported: Mutex<Vec<Record>>,
        flushes: Mutex<Vec<Duration>>,
    }

    impl ErrorReporter for RecordingReporter {
        fn report(&self, record: &Record) {
            self.reported.lock().push(record.clone());
        }

        fn flush(&self, timeout: Duration) -> bool {
            self.flushes.lock().push(timeout);
            true
        }
    }

    fn record(level: Level) -> Record {
        let mut fields = Fields::new();
        fields.insert("trace_id".to_string(), json!("t-1"));
        fields.insert("user_id".to_string(), json!("u-1"));
        fields.insert("order".to_string(), json!(7));
        Record {
            level,
            message: "checkout done".to_string(),
            fields,
            error: None,
            caller: Some("src/shop.rs:3".to_string()),
        }
    }

    #[test]
    fn emits_correlation_ids_as_top_level_keys() {
        let backend = TracingBackend::new();
        let lines = capture(|| backend.emit(&record(Level::Info)));

        assert_eq!(lines.len(), 1);
        let event = &lines[0];
        assert_eq!(event["level"], "info");
        assert_eq!(event["msg"], "checkout done");
        assert_eq!(event["trace_id"], "t-1");
        assert_eq!(event["user_id"], "u-1");
        assert_eq!(event["caller"], "src/shop.rs:3");
        assert!(event.get("request_id").is_none());
        assert!(event.get("target").is_none());
        assert!(event.get(SEVERITY_KEY).is_none());
    }

    #[test]
    fn other_fields_are_top_level_keys() {
        let backend = TracingBackend::new();
        let lines = capture(|| backend.emit(&record(Level::Warn)));

        assert_eq!(lines[0]["order"], 7);
        assert!(lines[0].get(FIELDS_KEY).is_none());
    }

    #[test]
    fn static_fields_are_top_level_keys() {
        let logger = Logger::new(Arc::new(TracingBackend::new()))
            .with_fields([("appname", json!("shop")), ("env", json!("prod"))]);
        let lines = capture(|| logger.info("started"));

        let event = &lines[0];
        assert_eq!(event["appname"], "shop");
        assert_eq!(event["env"], "prod");
        assert_eq!(event["msg"], "started");
        assert!(event.get(FIELDS_KEY).is_none());
    }

    #[test]
    fn caller_is_the_only_location_key() {
        let logger = Logger::new(Arc::new(TracingBackend::new()));
        let lines = capture(|| logger.info("located"));

        let event = &lines[0];
        let caller = event["caller"].as_str().unwrap();
        assert!(caller.contains("backend.rs"));
        assert!(event.get("file").is_none());
        assert!(event.get("line").is_none());
        assert!(event.get("line_number").is_none());
    }

    #[test]
    fn fatal_keeps_its_severity_on_an_error_event() {
        let backend = TracingBackend::new();
        let lines = capture(|| backend.emit(&record(Level::Fatal)));

        assert_eq!(lines[0]["level"], "fatal");
    }

    #[test]
    fn error_details_are_emitted() {
        let backend = TracingBackend::new();
        let mut rec = record(Level::Error);
        rec.error = Some(ErrorInfo::new(&io::Error::new(
            io::ErrorKind::TimedOut,
            "upstream timed out",
        )));
        let lines = capture(|| backend.emit(&rec));

        assert_eq!(lines[0]["error"], "upstream timed out");
        assert!(lines[0]["error_kind"].as_str().unwrap().ends_with("Error"));
    }

    #[test]
    fn only_error_levels_reach_the_reporter() {
        let reporter = Arc::new(RecordingReporter::default());
        let backend = TracingBackend::with_reporter(reporter.clone());

        capture(|| {
            for level in Level::ALL {
                backend.emit(&record(level));
            }
        });

        let levels: Vec<Level> = reporter.reported.lock().iter().map(|r| r.level).collect();
        assert_eq!(levels, vec![Level::Error, Level::Fatal, Level::Panic]);
    }

    #[test]
    fn flush_delegates_to_reporter() {
        let reporter = Arc::new(RecordingReporter::default());
        let backend = TracingBackend::with_reporter(reporter.clone());

        assert!(backend.flush(Duration::from_secs(2)));
        assert_eq!(*reporter.flushes.lock(), vec![Duration::from_secs(2)]);
        assert!(TracingBackend::new().flush(Duration::ZERO));
    }

    #[test]
    fn logger_over_tracing_backend() {
        let logger = Logger::new(Arc::new(TracingBackend::new())).with_field("component", "cart");
        let lines = capture(|| logger.info("added item"));

        assert_eq!(lines[0]["msg"], "added item");
        assert_eq!(lines[0]["component"], "cart");
    }
}
