//! Record validation against a field catalog
//!
//! Validation is a pure function from a raw JSON value to a typed record. Every
//! offending field is collected so one reject names all of them.

use super::catalog::{FieldKind, FieldSpec, RecordSchema};
use super::{format_instant, parse_instant, Record};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Validation failure naming the offending fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub fields: Vec<String>,
    pub message: String,
}

impl ValidationError {
    fn whole_record(message: impl Into<String>) -> Self {
        Self {
            fields: Vec::new(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a raw value into a typed record
pub fn validate<R: Record>(raw: &Value) -> Result<R, ValidationError> {
    let normalized = normalize(raw, R::SCHEMA)?;
    serde_json::from_value(Value::Object(normalized))
        .map_err(|e| ValidationError::whole_record(format!("invalid record: {}", e)))
}

/// Coerce every known field to its canonical JSON form, checking types and
/// required fields. Unknown keys are dropped.
pub fn normalize(raw: &Value, schema: &RecordSchema) -> Result<Map<String, Value>, ValidationError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| ValidationError::whole_record("record must be a JSON object"))?;

    let mut normalized = Map::new();
    let mut problems: Vec<(&'static str, &'static str)> = Vec::new();

    for (key, value) in obj {
        let Some(spec) = schema.resolve(key) else {
            tracing::debug!("Ignoring unknown field '{}' for {}", key, schema.table);
            continue;
        };
        if value.is_null() {
            continue;
        }
        if normalized.contains_key(spec.name) {
            problems.push((spec.name, "supplied more than once"));
            continue;
        }
        match coerce(spec, value) {
            Ok(v) => {
                if spec.name == schema.symbol_field && v.as_str().is_some_and(str::is_empty) {
                    problems.push((spec.name, "must not be empty"));
                } else {
                    normalized.insert(spec.name.to_string(), v);
                }
            }
            Err(reason) => problems.push((spec.name, reason)),
        }
    }

    for spec in schema.fields.iter().filter(|f| f.required) {
        let reported = problems.iter().any(|(name, _)| *name == spec.name);
        if !reported && !normalized.contains_key(spec.name) {
            problems.push((spec.name, "is required"));
        }
    }

    if problems.is_empty() {
        return Ok(normalized);
    }

    let message = problems
        .iter()
        .map(|(name, reason)| format!("{}: {}", name, reason))
        .collect::<Vec<_>>()
        .join("; ");
    let mut fields: Vec<String> = problems.iter().map(|(name, _)| name.to_string()).collect();
    fields.dedup();

    Err(ValidationError {
        fields,
        message: format!("invalid record: {}", message),
    })
}

fn coerce(spec: &FieldSpec, value: &Value) -> Result<Value, &'static str> {
    match spec.kind {
        FieldKind::Text => match value {
            Value::String(s) if spec.required => Ok(Value::String(s.trim().to_string())),
            Value::String(s) => Ok(Value::String(s.clone())),
            _ => Err("expected a string"),
        },
        FieldKind::Float => {
            let parsed = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            parsed
                .filter(|f| f.is_finite())
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or("expected a number")
        }
        FieldKind::Integer => {
            let parsed = match value {
                Value::Number(n) => n.as_i64().or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                        .map(|f| f as i64)
                }),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            parsed.map(Value::from).ok_or("expected an integer")
        }
        FieldKind::Boolean => match value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            _ => Err("expected a boolean"),
        },
        FieldKind::Timestamp => value
            .as_str()
            .and_then(parse_instant)
            .map(|dt| Value::String(format_instant(&dt)))
            .ok_or("expected an ISO-8601 timestamp"),
    }
}

/// Best-effort `(symbol, timestamp)` of a raw record, for reject reporting
pub fn key_hint(raw: &Value, schema: &RecordSchema) -> (Option<String>, Option<String>) {
    let Some(obj) = raw.as_object() else {
        return (None, None);
    };
    let lookup = |canonical: &str| {
        obj.iter()
            .find(|(key, value)| {
                !value.is_null()
                    && schema.resolve(key).is_some_and(|spec| spec.name == canonical)
            })
            .map(|(_, value)| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
    };
    (lookup(schema.symbol_field), lookup(schema.time_field))
}
