//! Aggregate statistics over stored feature rows

use super::models::{FeatureStats, SymbolStats};
use rusqlite::{params_from_iter, Connection};

fn symbol_filter(symbols: &[String]) -> String {
    if symbols.is_empty() {
        String::new()
    } else {
        let placeholders = vec!["?"; symbols.len()].join(", ");
        format!(" WHERE symbol IN ({})", placeholders)
    }
}

/// Totals and per-symbol ranges, optionally restricted to `symbols`
pub fn feature_stats(conn: &Connection, symbols: &[String]) -> rusqlite::Result<FeatureStats> {
    let filter = symbol_filter(symbols);

    let (total_rows, distinct_symbols, min_datetime, max_datetime) = conn.query_row(
        &format!(
            "SELECT COUNT(*), COUNT(DISTINCT symbol), MIN(datetime), MAX(datetime)
             FROM model_features{}",
            filter
        ),
        params_from_iter(symbols.iter()),
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
    )?;

    let mut stmt = conn.prepare(&format!(
        "SELECT symbol, COUNT(*), MIN(datetime), MAX(datetime)
         FROM model_features{}
         GROUP BY symbol
         ORDER BY symbol",
        filter
    ))?;
    let per_symbol = stmt
        .query_map(params_from_iter(symbols.iter()), |row| {
            Ok(SymbolStats {
                symbol: row.get(0)?,
                rows: row.get(1)?,
                first_datetime: row.get(2)?,
                last_datetime: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(FeatureStats {
        total_rows,
        distinct_symbols,
        min_datetime,
        max_datetime,
        symbols: per_symbol,
    })
}
