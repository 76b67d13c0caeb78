//! Flat JSON event format.
//!
//! Writes one JSON object per line with `time`, `level`, `msg` and every
//! structured field as a top-level key. The JSON-encoded `fields` value that
//! [`TracingBackend`](crate::TracingBackend) attaches is unpacked into the
//! object. A field whose name is already taken is written as `fields.<name>`.

use std::fmt;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::backend::{EVENT_TARGET, FIELDS_KEY, SEVERITY_KEY};

pub const TIME_KEY: &str = "time";
pub const LEVEL_KEY: &str = "level";
pub const MESSAGE_KEY: &str = "msg";

/// `tracing_subscriber` event formatter producing flat JSON lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatJsonFormat;

impl<S, N> FormatEvent<S, N> for FlatJsonFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut time = String::new();
        let time = SystemTime
            .format_time(&mut Writer::new(&mut time))
            .ok()
            .map(|()| time);

        let spans = ctx.event_scope().map(|scope| {
            scope
                .from_root()
                .map(|span| span.name())
                .collect::<Vec<_>>()
                .join(":")
        });

        let object = build_object(visitor.0, event.metadata(), time, spans);
        let line = serde_json::to_string(&Value::Object(object)).map_err(|_| fmt::Error)?;
        writeln!(writer, "{line}")
    }
}

fn build_object(
    mut fields: Map<String, Value>,
    metadata: &Metadata<'_>,
    time: Option<String>,
    spans: Option<String>,
) -> Map<String, Value> {
    let mut object = Map::new();
    if let Some(time) = time {
        object.insert(TIME_KEY.to_string(), Value::String(time));
    }

    let level = match fields.remove(SEVERITY_KEY) {
        Some(Value::String(severity)) => severity,
        _ => metadata.level().as_str().to_ascii_lowercase(),
    };
    object.insert(LEVEL_KEY.to_string(), Value::String(level));

    if let Some(message) = fields.remove("message") {
        object.insert(MESSAGE_KEY.to_string(), message);
    }
    if metadata.target() != EVENT_TARGET {
        object.insert("target".to_string(), Value::from(metadata.target()));
    }
    if let Some(spans) = spans.filter(|s| !s.is_empty()) {
        object.insert("span".to_string(), Value::String(spans));
    }

    let nested = fields.remove(FIELDS_KEY);
    for (key, value) in fields {
        insert_field(&mut object, key, value);
    }

    match nested {
        Some(Value::String(encoded)) => match serde_json::from_str::<Map<String, Value>>(&encoded) {
            Ok(extra) => {
                for (key, value) in extra {
                    insert_field(&mut object, key, value);
                }
            }
            Err(_) => insert_field(&mut object, FIELDS_KEY.to_string(), Value::String(encoded)),
        },
        Some(other) => insert_field(&mut object, FIELDS_KEY.to_string(), other),
        None => {}
    }
    object
}

fn insert_field(object: &mut Map<String, Value>, key: String, value: Value) {
    if object.contains_key(&key) {
        object.insert(format!("fields.{key}"), value);
    } else {
        object.insert(key, value);
    }
}

/// Collects event fields as JSON values.
#[derive(Default)]
struct FieldVisitor(Map<String, Value>);

impl FieldVisitor {
    fn put(&mut self, field: &Field, value: Value) {
        self.0.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.put(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, Value::from(format!("{value:?}")));
    }
}
