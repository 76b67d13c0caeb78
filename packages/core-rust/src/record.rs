//! The unit handed to a [`LogBackend`](crate::LogBackend).

use std::error::Error as StdError;

use serde::Serialize;

use crate::fields::Fields;
use crate::level::Level;

/// Description of an error attached with [`Logger::with_error`](crate::Logger::with_error).
///
/// The error is captured as data; the logger never inspects or rethrows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    /// `Display` rendering of the error.
    pub message: String,
    /// Type name of the error as seen at the attachment site.
    pub kind: String,
    /// `Display` renderings of the `source()` chain, outermost first.
    pub chain: Vec<String>,
}

impl ErrorInfo {
    /// Captures `err` and its source chain.
    #[must_use]
    pub fn new<E>(err: &E) -> Self
    where
        E: StdError + ?Sized,
    {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }

        Self {
            message: err.to_string(),
            kind: std::any::type_name::<E>().to_string(),
            chain,
        }
    }
}

/// One emitted log record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub level: Level,
    pub message: String,
    /// Static, derived, and correlation fields, merged.
    pub fields: Fields,
    pub error: Option<ErrorInfo>,
    /// `file:line` of the logging call, when caller reporting is enabled.
    pub caller: Option<String>,
}

impl Record {
    /// Returns the string value of `key`, if present and a string.
    #[must_use]
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(serde_json::Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use super::*;

    #[derive(Debug)]
    struct Inner;

    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("connection refused")
        }
    }

    impl StdError for Inner {}

    #[derive(Debug)]
    struct Outer(Inner);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("failed to load profile")
        }
    }

    impl StdError for Outer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn error_info_captures_message_kind_and_chain() {
        let info = ErrorInfo::new(&Outer(Inner));
        assert_eq!(info.message, "failed to load profile");
        assert!(info.kind.ends_with("Outer"));
        assert_eq!(info.chain, vec!["connection refused".to_string()]);
    }

    #[test]
    fn error_info_from_io_error() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let info = ErrorInfo::new(&err);
        assert_eq!(info.message, "missing file");
        assert!(info.chain.is_empty());
    }

    #[test]
    fn field_str_reads_only_strings() {
        let mut fields = Fields::new();
        fields.insert("trace_id".to_string(), serde_json::json!("abc"));
        fields.insert("attempt".to_string(), serde_json::json!(3));
        let record = Record {
            level: Level::Info,
            message: "hello".to_string(),
            fields,
            error: None,
            caller: None,
        };
        assert_eq!(record.field_str("trace_id"), Some("abc"));
        assert_eq!(record.field_str("attempt"), None);
        assert_eq!(record.field_str("missing"), None);
    }
}
