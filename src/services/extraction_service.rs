//! Extraction Service
//!
//! Read path over stored feature rows: filters become one parameterized query,
//! results are rendered as JSON records or CSV.

use crate::db::sqlite::records::{quote_ident, select_rows};
use crate::db::SqliteDb;
use crate::error::{AppError, Result};
use crate::records::{format_instant, parse_instant, FieldSpec, RecordSchema, FEATURES};
use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

/// Raw extraction query string. Kept as text so malformed numbers are reported
/// with our own message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractParams {
    pub symbols: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub fields: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionLimits {
    pub default_limit: i64,
    pub max_limit: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractFormat {
    Json,
    Csv,
}

/// A validated extraction, ready to run
#[derive(Debug, Clone)]
pub struct ExtractQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
    pub columns: Vec<&'static FieldSpec>,
    pub limit: i64,
    pub offset: i64,
    pub format: ExtractFormat,
}

/// Rows of one extraction in projection order
#[derive(Debug, Clone)]
pub struct Extraction {
    pub query: ExtractQuery,
    pub rows: Vec<Map<String, Value>>,
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number(name: &str, raw: Option<&str>, default: i64) -> Result<i64> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(s) => s
            .parse::<i64>()
            .map_err(|_| AppError::Validation(format!("{} must be an integer, got '{}'", name, s))),
    }
}

fn parse_bound(name: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_instant(s).map(Some).ok_or_else(|| {
            AppError::Validation(format!("{} must be an ISO-8601 timestamp, got '{}'", name, s))
        }),
    }
}

fn projection(schema: &RecordSchema, raw: Option<&str>) -> Result<Vec<&'static FieldSpec>> {
    let requested = split_list(raw);
    if requested.is_empty() {
        return Ok(schema.fields.iter().collect());
    }

    let unknown: Vec<&str> = requested
        .iter()
        .filter(|name| schema.field(name).is_none())
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        return Err(AppError::Validation(format!("Unknown fields: {}", unknown.join(", "))));
    }

    let mut columns: Vec<&'static FieldSpec> = Vec::with_capacity(requested.len());
    for name in &requested {
        if let Some(spec) = schema.field(name) {
            if !columns.iter().any(|c| c.name == spec.name) {
                columns.push(spec);
            }
        }
    }
    Ok(columns)
}

impl ExtractQuery {
    /// Validate the raw parameters and build the read query.
    ///
    /// Every client error is raised here, before any storage access.
    pub fn build(params: &ExtractParams, limits: ExtractionLimits) -> Result<Self> {
        let schema = &FEATURES;

        let format = match params.format.as_deref().map(str::trim) {
            None | Some("") => ExtractFormat::Json,
            Some(f) if f.eq_ignore_ascii_case("json") => ExtractFormat::Json,
            Some(f) if f.eq_ignore_ascii_case("csv") => ExtractFormat::Csv,
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "format must be 'json' or 'csv', got '{}'",
                    other
                )))
            }
        };

        let columns = projection(schema, params.fields.as_deref())?;

        let mut symbols: Vec<String> = Vec::new();
        for symbol in split_list(params.symbols.as_deref()) {
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }

        let start = parse_bound("start", params.start.as_deref())?;
        let end = parse_bound("end", params.end.as_deref())?;
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(AppError::Validation("start must not be after end".to_string()));
            }
        }

        let limit = parse_number("limit", params.limit.as_deref(), limits.default_limit)?;
        if limit < 1 {
            return Err(AppError::Validation("limit must be at least 1".to_string()));
        }
        let limit = limit.min(limits.max_limit);
        let offset = parse_number("offset", params.offset.as_deref(), 0)?;
        if offset < 0 {
            return Err(AppError::Validation("offset must not be negative".to_string()));
        }

        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();
        let symbol_col = quote_ident(schema.symbol_field);
        let time_col = quote_ident(schema.time_field);

        if !symbols.is_empty() {
            conditions.push(format!(
                "{} IN ({})",
                symbol_col,
                vec!["?"; symbols.len()].join(", ")
            ));
            values.extend(symbols.into_iter().map(SqlValue::Text));
        }
        if let Some(s) = start {
            conditions.push(format!("{} >= ?", time_col));
            values.push(SqlValue::Text(format_instant(&s)));
        }
        if let Some(e) = end {
            conditions.push(format!("{} <= ?", time_col));
            values.push(SqlValue::Text(format_instant(&e)));
        }

        let select_list: Vec<String> = columns.iter().map(|c| quote_ident(c.name)).collect();
        let mut sql = format!("SELECT {} FROM {}", select_list.join(", "), schema.table);
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(&format!(" ORDER BY {}, {} LIMIT ? OFFSET ?", symbol_col, time_col));
        values.push(SqlValue::Integer(limit));
        values.push(SqlValue::Integer(offset));

        Ok(Self {
            sql,
            params: values,
            columns,
            limit,
            offset,
            format,
        })
    }
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Extraction {
    pub fn field_names(&self) -> Vec<&'static str> {
        self.query.columns.iter().map(|c| c.name).collect()
    }

    pub fn to_json(&self) -> Value {
        json!({
            "status": "success",
            "count": self.rows.len(),
            "limit": self.query.limit,
            "offset": self.query.offset,
            "fields": self.field_names(),
            "data": self.rows,
        })
    }

    /// Header row plus one line per row; null cells are empty
    pub fn to_csv(&self) -> Result<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(self.field_names())?;
        for row in &self.rows {
            wtr.write_record(
                self.query
                    .columns
                    .iter()
                    .map(|c| csv_cell(row.get(c.name).unwrap_or(&Value::Null))),
            )?;
        }
        let data = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("failed to flush CSV writer: {}", e)))?;
        String::from_utf8(data).map_err(|e| AppError::Internal(format!("CSV output is not UTF-8: {}", e)))
    }
}

/// Download name for a CSV extraction
pub fn csv_filename(now: DateTime<Utc>) -> String {
    format!("features_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Extraction service for business logic
pub struct ExtractionService;

impl ExtractionService {
    pub fn extract(db: &SqliteDb, params: &ExtractParams, limits: ExtractionLimits) -> Result<Extraction> {
        let query = ExtractQuery::build(params, limits)?;
        debug!("Extraction query: {} ({} params)", query.sql, query.params.len());

        let conn = db.session()?;
        let rows = select_rows(&conn, &query.sql, &query.params, &query.columns)?;
        Ok(Extraction { query, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::validation::validate;
    use crate::records::FeatureRecord;
    use crate::db::sqlite::records::insert_ignoring_conflict;

    const LIMITS: ExtractionLimits = ExtractionLimits {
        default_limit: 1000,
        max_limit: 10_000,
    };

    fn params(pairs: &[(&str, &str)]) -> ExtractParams {
        let mut p = ExtractParams::default();
        for (key, value) in pairs {
            let slot = match *key {
                "symbols" => &mut p.symbols,
                "start" => &mut p.start,
                "end" => &mut p.end,
                "fields" => &mut p.fields,
                "limit" => &mut p.limit,
                "offset" => &mut p.offset,
                "format" => &mut p.format,
                other => panic!("unknown param {}", other),
            };
            *slot = Some(value.to_string());
        }
        p
    }

    fn seeded() -> (tempfile::TempDir, SqliteDb) {
        let (dir, db) = SqliteDb::temporary();
        let conn = db.session().unwrap();
        for symbol in ["AAPL", "MSFT"] {
            for day in 1..=6 {
                let raw = serde_json::json!({
                    "symbol": symbol,
                    "datetime": format!("2026-02-{:02}T16:00:00", day),
                    "price": 100.0 + day as f64,
                    "sector": if day == 1 { Some("Tech, \"large\"") } else { None },
                });
                let record: FeatureRecord = validate(&raw).unwrap();
                insert_ignoring_conflict(&conn, &record).unwrap();
            }
        }
        drop(conn);
        (dir, db)
    }

    fn validation_message(err: AppError) -> String {
        match err {
            AppError::Validation(msg) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_fields_named_exactly() {
        let err = ExtractQuery::build(&params(&[("fields", "symbol,not_a_real_field,price")]), LIMITS)
            .unwrap_err();
        assert_eq!(validation_message(err), "Unknown fields: not_a_real_field");
    }

    #[test]
    fn test_projection_collapses_duplicates() {
        let query = ExtractQuery::build(&params(&[("fields", "price, symbol,price")]), LIMITS).unwrap();
        let names: Vec<&str> = query.columns.iter().map(|c| c.name).collect();
        assert_eq!(names, ["price", "symbol"]);

        let all = ExtractQuery::build(&ExtractParams::default(), LIMITS).unwrap();
        assert_eq!(all.columns.len(), FEATURES.fields.len());
        assert_eq!(all.limit, 1000);
        assert_eq!(all.offset, 0);
        assert_eq!(all.format, ExtractFormat::Json);
    }

    #[test]
    fn test_pagination_rules() {
        let clamped = ExtractQuery::build(&params(&[("limit", "50000")]), LIMITS).unwrap();
        assert_eq!(clamped.limit, 10_000);

        for bad in [
            vec![("limit", "0")],
            vec![("limit", "ten")],
            vec![("offset", "-1")],
            vec![("offset", "1.5")],
            vec![("start", "2026-02-05"), ("end", "2026-02-01")],
            vec![("start", "yesterday")],
            vec![("format", "xml")],
        ] {
            let err = ExtractQuery::build(&params(&bad), LIMITS).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_values_are_bound() {
        let query = ExtractQuery::build(
            &params(&[("symbols", "AAPL,'; DROP TABLE model_features; --"), ("start", "2026-02-01")]),
            LIMITS,
        )
        .unwrap();
        assert!(!query.sql.contains("DROP"));
        assert!(query.sql.contains("\"symbol\" IN (?, ?)"));
        assert!(query.sql.ends_with("ORDER BY \"symbol\", \"datetime\" LIMIT ? OFFSET ?"));
        assert_eq!(query.params.len(), 5);
    }

    #[test]
    fn test_repeated_symbols_bind_once() {
        let query = ExtractQuery::build(&params(&[("symbols", "AAPL,MSFT,AAPL, MSFT")]), LIMITS).unwrap();
        assert!(query.sql.contains("\"symbol\" IN (?, ?)"));
        assert_eq!(query.params.len(), 4);
        assert_eq!(query.params[0], SqlValue::Text("AAPL".to_string()));
        assert_eq!(query.params[1], SqlValue::Text("MSFT".to_string()));
    }

    #[test]
    fn test_disjoint_contiguous_pages() {
        let (_dir, db) = seeded();
        let page = |offset: &str| {
            ExtractionService::extract(
                &db,
                &params(&[("fields", "symbol,datetime"), ("limit", "5"), ("offset", offset)]),
                LIMITS,
            )
            .unwrap()
            .rows
        };

        let first = page("0");
        let second = page("5");
        assert_eq!(first.len(), 5);
        assert_eq!(second.len(), 5);
        assert_eq!(first[4]["datetime"], "2026-02-05T16:00:00.000000Z");
        assert_eq!(second[0]["datetime"], "2026-02-06T16:00:00.000000Z");
        assert_eq!(second[1]["symbol"], "MSFT");
        assert!(first.iter().all(|row| !second.contains(row)));
    }

    #[test]
    fn test_symbol_and_time_filters() {
        let (_dir, db) = seeded();
        let result = ExtractionService::extract(
            &db,
            &params(&[
                ("symbols", "MSFT"),
                ("start", "2026-02-02T16:00:00Z"),
                ("end", "2026-02-04T16:00:00Z"),
                ("fields", "datetime,price"),
            ]),
            LIMITS,
        )
        .unwrap();

        let prices: Vec<f64> = result.rows.iter().map(|r| r["price"].as_f64().unwrap()).collect();
        assert_eq!(prices, [102.0, 103.0, 104.0]);

        let body = result.to_json();
        assert_eq!(body["count"], 3);
        assert_eq!(body["fields"], serde_json::json!(["datetime", "price"]));
    }

    #[test]
    fn test_csv_rendering() {
        let (_dir, db) = seeded();
        let result = ExtractionService::extract(
            &db,
            &params(&[("symbols", "AAPL"), ("fields", "symbol,sector,price"), ("limit", "2")]),
            LIMITS,
        )
        .unwrap();

        let csv = result.to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, ["symbol,sector,price", "AAPL,\"Tech, \"\"large\"\"\",101.0", "AAPL,,102.0"]);
    }

    #[test]
    fn test_csv_header_only_when_empty() {
        let (_dir, db) = seeded();
        let result = ExtractionService::extract(
            &db,
            &params(&[("symbols", "NOPE"), ("fields", "symbol,price"), ("format", "csv")]),
            LIMITS,
        )
        .unwrap();
        assert_eq!(result.query.format, ExtractFormat::Csv);
        assert_eq!(result.to_csv().unwrap(), "symbol,price\n");
    }

    #[test]
    fn test_client_errors_skip_storage() {
        let db = SqliteDb::unreachable();
        let err = ExtractionService::extract(&db, &params(&[("fields", "bogus")]), LIMITS).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = ExtractionService::extract(&db, &ExtractParams::default(), LIMITS).unwrap_err();
        assert!(matches!(err, AppError::Pool(_)));
    }
}
