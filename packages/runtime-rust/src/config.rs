//! Logger configuration, sourced from the environment or built explicitly.

use aloig_core::{Fields, Level};

/// Environments whose error-level records go to the error-reporting backend.
pub const ERROR_REPORTING_ENVIRONMENTS: [&str; 3] = ["staging", "sandbox", "prod"];

/// Environment that switches output to human-readable text.
pub const DEV_ENVIRONMENT: &str = "dev";

/// Default sample rate forwarded to the error-reporting backend.
pub const DEFAULT_TRACES_SAMPLE_RATE: f64 = 0.2;

/// Configuration for [`build_logger`](crate::build_logger).
#[derive(Debug, Clone, PartialEq)]
pub struct LoggerConfig {
    /// Deployment environment (`dev`, `staging`, `prod`, ...).
    pub environment: String,
    /// Application name, reported as `appname`.
    pub app_name: String,
    /// Error-reporting DSN. Empty disables reporting.
    pub sentry_dsn: String,
    /// Release identifier, conventionally `app@deploy`.
    pub release: String,
    /// Sample rate for performance traces (0.0 - 1.0).
    pub traces_sample_rate: f64,
    /// Minimum level emitted.
    pub level: Level,
    /// Whether records carry the `file:line` of the logging call.
    pub report_caller: bool,
    /// Static fields added to every record outside `dev`.
    pub custom_fields: Fields,
    pub host_name: String,
    pub server_name: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            environment: String::new(),
            app_name: String::new(),
            sentry_dsn: String::new(),
            release: String::new(),
            traces_sample_rate: DEFAULT_TRACES_SAMPLE_RATE,
            level: Level::Info,
            report_caller: true,
            custom_fields: Fields::new(),
            host_name: String::new(),
            server_name: String::new(),
        }
    }
}

impl LoggerConfig {
    /// Reads `ENVIRONMENT`, `APP_NAME`, `SENTRY_DSN`, `DEPLOY_ID`, `HOSTNAME`
    /// and `LOG_LEVEL` from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// Missing variables read as empty strings.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).unwrap_or_default();
        let app_name = var("APP_NAME");

        Self {
            environment: var("ENVIRONMENT"),
            sentry_dsn: var("SENTRY_DSN"),
            release: format!("{app_name}@{}", var("DEPLOY_ID")),
            host_name: var("HOSTNAME"),
            server_name: app_name.clone(),
            level: Level::parse_or(&var("LOG_LEVEL"), "info"),
            app_name,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_dev(&self) -> bool {
        self.environment == DEV_ENVIRONMENT
    }

    #[must_use]
    pub fn format(&self) -> LogFormat {
        if self.is_dev() {
            LogFormat::Text
        } else {
            LogFormat::Json
        }
    }

    /// Whether an error reporter should be built for this configuration.
    #[must_use]
    pub fn reports_errors(&self) -> bool {
        is_error_reporting_env(&self.environment) && !self.sentry_dsn.is_empty()
    }

    /// Fields attached to every record outside `dev`.
    #[must_use]
    pub fn static_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("env".to_string(), self.environment.clone().into());
        fields.insert("appname".to_string(), self.app_name.clone().into());
        fields.insert("hostname".to_string(), self.host_name.clone().into());
        fields.insert("servername".to_string(), self.server_name.clone().into());
        fields.insert("release".to_string(), self.release.clone().into());
        for (key, value) in &self.custom_fields {
            fields.insert(key.clone(), value.clone());
        }
        fields
    }
}

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

/// Whether `env` sends error-level records to the error-reporting backend.
#[must_use]
pub fn is_error_reporting_env(env: &str) -> bool {
    ERROR_REPORTING_ENVIRONMENTS.contains(&env)
}

/// Reads a level name from `var`, falling back to `default`, then to `Info`.
#[must_use]
pub fn level_from_env(var: &str, default: &str) -> Level {
    let name = std::env::var(var).unwrap_or_default();
    Level::parse_or(&name, default)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn logger_config_defaults() {
        let config = LoggerConfig::default();
        assert_eq!(config.level, Level::Info);
        assert!(config.report_caller);
        assert!((config.traces_sample_rate - 0.2).abs() < f64::EPSILON);
        assert!(config.custom_fields.is_empty());
        assert!(!config.reports_errors());
    }

    #[test]
    fn from_lookup_reads_every_variable() {
        let config = LoggerConfig::from_lookup(lookup(&[
            ("ENVIRONMENT", "staging"),
            ("APP_NAME", "billing"),
            ("SENTRY_DSN", "https://key@errors.example.com/42"),
            ("DEPLOY_ID", "d-17"),
            ("HOSTNAME", "pod-3"),
            ("LOG_LEVEL", "debug"),
        ]));

        assert_eq!(config.environment, "staging");
        assert_eq!(config.app_name, "billing");
        assert_eq!(config.release, "billing@d-17");
        assert_eq!(config.host_name, "pod-3");
        assert_eq!(config.server_name, "billing");
        assert_eq!(config.level, Level::Debug);
        assert!(config.reports_errors());
    }

    #[test]
    fn from_lookup_with_nothing_set() {
        let config = LoggerConfig::from_lookup(|_| None);
        assert_eq!(config.environment, "");
        assert_eq!(config.release, "@");
        assert_eq!(config.level, Level::Info);
    }

    #[test]
    fn invalid_level_name_falls_back_to_info() {
        let config = LoggerConfig::from_lookup(lookup(&[("LOG_LEVEL", "chatty")]));
        assert_eq!(config.level, Level::Info);
    }

    #[test]
    fn error_reporting_environments() {
        let cases = [
            ("dev", false),
            ("staging", true),
            ("sandbox", true),
            ("prod", true),
            ("develop", false),
            ("test", false),
            ("", false),
        ];
        for (env, expected) in cases {
            assert_eq!(is_error_reporting_env(env), expected, "env {env:?}");
        }
    }

    #[test]
    fn reporting_needs_a_dsn() {
        let config = LoggerConfig {
            environment: "prod".to_string(),
            ..LoggerConfig::default()
        };
        assert!(!config.reports_errors());
    }

    #[test]
    fn format_follows_environment() {
        let dev = LoggerConfig {
            environment: "dev".to_string(),
            ..LoggerConfig::default()
        };
        let prod = LoggerConfig {
            environment: "prod".to_string(),
            ..LoggerConfig::default()
        };
        assert_eq!(dev.format(), LogFormat::Text);
        assert_eq!(prod.format(), LogFormat::Json);
    }

    #[test]
    fn static_fields_include_custom_fields() {
        let mut custom_fields = Fields::new();
        custom_fields.insert("module".to_string(), json!("checkout"));
        let config = LoggerConfig {
            environment: "prod".to_string(),
            app_name: "shop".to_string(),
            custom_fields,
            ..LoggerConfig::default()
        };

        let fields = config.static_fields();
        assert_eq!(fields["env"], "prod");
        assert_eq!(fields["appname"], "shop");
        assert_eq!(fields["module"], "checkout");
        assert!(fields.contains_key("hostname"));
        assert!(fields.contains_key("servername"));
        assert!(fields.contains_key("release"));
    }

    #[test]
    fn level_from_env_uses_default_for_unset_variable() {
        assert_eq!(
            level_from_env("ALOIG_TEST_SURELY_UNSET_LEVEL", "warn"),
            Level::Warn
        );
    }
}
