//! Builds a production [`Logger`] from a [`LoggerConfig`].

use std::collections::BTreeMap;
use std::sync::Arc;

use aloig_core::Logger;

use crate::backend::TracingBackend;
use crate::config::LoggerConfig;
use crate::reporter::{ErrorReporter, ReporterError, ReporterSettings, SentryReporter};

/// Builds a logger writing through `tracing`, with error reporting when the
/// environment calls for it.
///
/// A DSN that cannot be used is logged at error level; the logger is still
/// returned, without a reporter.
#[must_use]
pub fn build_logger(config: &LoggerConfig) -> Logger {
    let (backend, reporter_error) = match build_reporter(config) {
        Ok(Some(reporter)) => (TracingBackend::with_reporter(reporter), None),
        Ok(None) => (TracingBackend::new(), None),
        Err(err) => (TracingBackend::new(), Some(err)),
    };
    let has_reporter = backend.has_reporter();

    let mut logger = Logger::new(Arc::new(backend))
        .with_min_level(config.level)
        .with_report_caller(config.report_caller);
    if !config.is_dev() {
        logger = logger.with_fields(config.static_fields());
    }

    if let Some(err) = reporter_error {
        logger.with_error(&err).error("error reporting disabled");
    } else if has_reporter {
        logger.info("error reporting initialized");
    }
    logger
}

/// Settings stamped on every reported event.
#[must_use]
pub fn reporter_settings(config: &LoggerConfig) -> ReporterSettings {
    let tags = BTreeMap::from([
        ("env".to_string(), config.environment.clone()),
        ("appname".to_string(), config.app_name.clone()),
        ("hostname".to_string(), config.host_name.clone()),
        ("servername".to_string(), config.server_name.clone()),
        ("release".to_string(), config.release.clone()),
    ]);

    ReporterSettings {
        environment: config.environment.clone(),
        release: config.release.clone(),
        server_name: config.server_name.clone(),
        traces_sample_rate: config.traces_sample_rate,
        tags,
    }
}

fn build_reporter(config: &LoggerConfig) -> Result<Option<Arc<dyn ErrorReporter>>, ReporterError> {
    if !config.reports_errors() {
        return Ok(None);
    }
    let reporter = SentryReporter::new(&config.sentry_dsn, reporter_settings(config))?;
    Ok(Some(Arc::new(reporter)))
}

#[cfg(test)]
mod tests {
    use aloig_core::Level;

    use super::*;

    fn config(environment: &str) -> LoggerConfig {
        LoggerConfig {
            environment: environment.to_string(),
            app_name: "shop".to_string(),
            release: "shop@d-2".to_string(),
            host_name: "pod-1".to_string(),
            server_name: "shop".to_string(),
            ..LoggerConfig::default()
        }
    }

    #[test]
    fn dev_logger_has_no_static_fields() {
        let logger = build_logger(&config("dev"));
        assert!(logger.fields().is_empty());
    }

    #[test]
    fn non_dev_logger_carries_static_fields() {
        let logger = build_logger(&config("staging"));
        assert_eq!(logger.fields()["env"], "staging");
        assert_eq!(logger.fields()["appname"], "shop");
        assert_eq!(logger.fields()["hostname"], "pod-1");
        assert_eq!(logger.fields()["servername"], "shop");
        assert_eq!(logger.fields()["release"], "shop@d-2");
    }

    #[test]
    fn level_and_caller_come_from_config() {
        let logger = build_logger(&LoggerConfig {
            level: Level::Warn,
            report_caller: false,
            ..config("prod")
        });
        assert_eq!(logger.min_level(), Level::Warn);
        assert!(!logger.is_enabled(Level::Info));
    }

    #[test]
    fn no_reporter_outside_reporting_environments() {
        let cfg = LoggerConfig {
            sentry_dsn: "https://key@errors.example.com/1".to_string(),
            ..config("dev")
        };
        assert!(build_reporter(&cfg).unwrap().is_none());
    }

    #[test]
    fn reporter_built_for_prod_with_dsn() {
        let cfg = LoggerConfig {
            sentry_dsn: "https://key@errors.example.com/1".to_string(),
            ..config("prod")
        };
        assert!(build_reporter(&cfg).unwrap().is_some());
    }

    #[test]
    fn bad_dsn_is_survivable() {
        let cfg = LoggerConfig {
            sentry_dsn: "::not a dsn::".to_string(),
            ..config("prod")
        };
        assert!(matches!(build_reporter(&cfg), Err(ReporterError::Dsn(_))));
        let logger = build_logger(&cfg);
        assert!(logger.flush(std::time::Duration::from_millis(10)));
    }

    #[test]
    fn reporter_settings_tag_static_attributes() {
        let settings = reporter_settings(&config("sandbox"));
        assert_eq!(settings.environment, "sandbox");
        assert_eq!(settings.release, "shop@d-2");
        assert_eq!(settings.tags["appname"], "shop");
        assert_eq!(settings.tags["env"], "sandbox");
        assert_eq!(settings.tags.len(), 5);
    }
}
