//! Structured fields attached to log records.

use std::collections::BTreeMap;

use crate::context::{read, Context, CorrelationKey};

/// Structured fields of a record. `BTreeMap` keeps rendering order deterministic.
pub type Fields = BTreeMap<String, serde_json::Value>;

/// Correlation identifiers projected out of a [`Context`].
pub type CorrelationFields = BTreeMap<&'static str, String>;

/// Projects a handle into the correlation fields it carries.
///
/// Only non-empty identifiers are included, so the result has between zero
/// and four entries. An absent handle yields an empty map.
#[must_use]
pub fn extract<'a>(handle: impl Into<Option<&'a Context>>) -> CorrelationFields {
    let Some(ctx) = handle.into() else {
        return CorrelationFields::new();
    };

    CorrelationKey::ALL
        .into_iter()
        .filter_map(|key| {
            let value = read(ctx, key);
            (!value.is_empty()).then(|| (key.as_str(), value.to_string()))
        })
        .collect()
}

/// Merges correlation fields into `fields`, overwriting same-named entries.
pub fn merge_correlation(fields: &mut Fields, correlation: CorrelationFields) {
    for (key, value) in correlation {
        fields.insert(key.to_string(), serde_json::Value::String(value));
    }
}
