//! Catalog-driven reads and writes of record tables
//!
//! Identifiers come from the static field catalogs; values are always bound.

use crate::records::{format_instant, parse_instant, FieldKind, FieldSpec, Record, RecordSchema};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use serde_json::{Map, Number, Value};

/// Quote an allow-listed identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name)
}

fn insert_sql(schema: &RecordSchema) -> String {
    let columns: Vec<String> = schema.fields.iter().map(|f| quote_ident(f.name)).collect();
    let placeholders: Vec<String> = (1..=schema.fields.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}, {}) DO NOTHING",
        schema.table,
        columns.join(", "),
        placeholders.join(", "),
        quote_ident(schema.symbol_field),
        quote_ident(schema.time_field),
    )
}

/// Insert a record unless its `(symbol, instant)` key already exists.
///
/// Returns `true` when a new row was written and `false` when the key was
/// already present.
pub fn insert_ignoring_conflict<R: Record>(conn: &Connection, record: &R) -> rusqlite::Result<bool> {
    let values = to_sql_values(record)?;
    let mut stmt = conn.prepare_cached(&insert_sql(R::SCHEMA))?;
    let affected = stmt.execute(params_from_iter(values.iter()))?;
    Ok(affected == 1)
}

/// Whether a write failed on a CHECK/NOT NULL/UNIQUE constraint
pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Column values of a record in catalog order
pub fn to_sql_values<R: Record>(record: &R) -> rusqlite::Result<Vec<SqlValue>> {
    let json = serde_json::to_value(record)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    let map = json.as_object().ok_or_else(|| {
        rusqlite::Error::ToSqlConversionFailure("record did not serialize to an object".into())
    })?;

    R::SCHEMA
        .fields
        .iter()
        .map(|spec| {
            if spec.name == R::SCHEMA.time_field {
                // already judged by the validator; written in canonical form
                Ok(SqlValue::Text(format_instant(&record.instant())))
            } else {
                sql_value(spec, map.get(spec.name).unwrap_or(&Value::Null))
            }
        })
        .collect()
}

fn sql_value(spec: &FieldSpec, value: &Value) -> rusqlite::Result<SqlValue> {
    let converted = match (spec.kind, value) {
        (_, Value::Null) => Some(SqlValue::Null),
        (FieldKind::Text, Value::String(s)) => Some(SqlValue::Text(s.clone())),
        (FieldKind::Float, Value::Number(n)) => n.as_f64().map(SqlValue::Real),
        (FieldKind::Integer, Value::Number(n)) => n.as_i64().map(SqlValue::Integer),
        (FieldKind::Boolean, Value::Bool(b)) => Some(SqlValue::Integer(i64::from(*b))),
        (FieldKind::Timestamp, Value::String(s)) => {
            parse_instant(s).map(|dt| SqlValue::Text(format_instant(&dt)))
        }
        _ => None,
    };
    converted.ok_or_else(|| {
        rusqlite::Error::ToSqlConversionFailure(
            format!("field '{}' has an unexpected value: {}", spec.name, value).into(),
        )
    })
}

/// JSON form of a stored column value
pub fn json_value(spec: &FieldSpec, value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => match spec.kind {
            FieldKind::Boolean => Value::Bool(i != 0),
            FieldKind::Float => Number::from_f64(i as f64).map(Value::Number).unwrap_or(Value::Null),
            _ => Value::from(i),
        },
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(_) => Value::Null,
    }
}

/// Run a prepared read and map each row to an ordered JSON object
pub fn select_rows(
    conn: &Connection,
    sql: &str,
    params: &[SqlValue],
    columns: &[&'static FieldSpec],
) -> rusqlite::Result<Vec<Map<String, Value>>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
        let mut record = Map::with_capacity(columns.len());
        for (idx, spec) in columns.iter().enumerate() {
            record.insert(spec.name.to_string(), json_value(spec, row.get_ref(idx)?));
        }
        Ok(record)
    })?;

    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::migrations::run_migrations;
    use crate::records::{validation::validate, FeatureRecord, MarketDataItem, FEATURES};
    use serde_json::json;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn feature(raw: Value) -> FeatureRecord {
        validate(&raw).unwrap()
    }

    #[test]
    fn test_insert_sql_shape() {
        let sql = insert_sql(&FEATURES);
        assert!(sql.starts_with("INSERT INTO model_features (\"symbol\", \"datetime\""));
        assert!(sql.contains("?37"));
        assert!(sql.ends_with("ON CONFLICT (\"symbol\", \"datetime\") DO NOTHING"));
    }

    #[test]
    fn test_insert_then_duplicate() {
        let conn = test_conn();
        let record = feature(json!({"symbol": "AAPL", "datetime": "2026-02-12T16:00:00", "price": 100}));

        assert!(insert_ignoring_conflict(&conn, &record).unwrap());
        assert!(!insert_ignoring_conflict(&conn, &record).unwrap());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM model_features", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_time_key_written_canonically() {
        let conn = test_conn();
        let record = feature(json!({"symbol": "AAPL", "datetime": "2026-02-12T17:00:00+01:00"}));
        insert_ignoring_conflict(&conn, &record).unwrap();

        let stored: String = conn
            .query_row("SELECT datetime FROM model_features", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, "2026-02-12T16:00:00.000000Z");
    }

    #[test]
    fn test_equivalent_instants_collide() {
        let conn = test_conn();
        let a = feature(json!({"symbol": "AAPL", "datetime": "2026-02-12T16:00:00"}));
        let b = feature(json!({"symbol": "AAPL", "datetime": "2026-02-12T17:00:00+01:00"}));

        assert!(insert_ignoring_conflict(&conn, &a).unwrap());
        assert!(!insert_ignoring_conflict(&conn, &b).unwrap());
    }

    #[test]
    fn test_check_constraint_is_an_error() {
        let conn = test_conn();
        let record = feature(json!({"symbol": "AAPL", "datetime": "2026-02-12", "volume": -5}));

        let err = insert_ignoring_conflict(&conn, &record).unwrap_err();
        assert!(is_constraint_violation(&err));
    }

    #[test]
    fn test_market_data_high_low_check() {
        let conn = test_conn();
        let bar: MarketDataItem = validate(&json!({
            "symbol": "TSLA", "ts": "2026-02-12T16:00:00Z",
            "open": 10.0, "high": 9.0, "low": 11.0, "close": 10.0, "volume": 100, "vwap": 10.0
        }))
        .unwrap();
        let err = insert_ignoring_conflict(&conn, &bar).unwrap_err();
        assert!(is_constraint_violation(&err));
    }

    #[test]
    fn test_select_rows_round_trips_types() {
        let conn = test_conn();
        let record = feature(json!({
            "symbol": "SPY", "datetime": "2026-02-12T16:00:00",
            "price": 500, "volume": 10, "is_etf": true, "sector": "Index, \"broad\""
        }));
        insert_ignoring_conflict(&conn, &record).unwrap();

        let columns: Vec<&'static FieldSpec> = ["symbol", "price", "volume", "is_etf", "sector", "beta"]
            .iter()
            .map(|name| FEATURES.field(name).unwrap())
            .collect();
        let rows = select_rows(
            &conn,
            "SELECT \"symbol\", \"price\", \"volume\", \"is_etf\", \"sector\", \"beta\" FROM model_features",
            &[],
            &columns,
        )
        .unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        let keys: Vec<&String> = row.keys().collect();
        assert_eq!(keys, ["symbol", "price", "volume", "is_etf", "sector", "beta"]);
        assert_eq!(row["price"], json!(500.0));
        assert_eq!(row["volume"], json!(10));
        assert_eq!(row["is_etf"], json!(true));
        assert_eq!(row["sector"], json!("Index, \"broad\""));
        assert_eq!(row["beta"], Value::Null);
    }
}
