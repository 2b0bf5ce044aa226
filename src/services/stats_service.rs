//! Stats Service

use crate::db::sqlite::models::FeatureStats;
use crate::db::SqliteDb;
use crate::error::Result;

/// Stats service for business logic
pub struct StatsService;

impl StatsService {
    /// Totals and per-symbol ranges. `symbols` is a comma separated filter;
    /// empty or absent means every symbol.
    pub fn feature_stats(db: &SqliteDb, symbols: Option<&str>) -> Result<FeatureStats> {
        let mut filter: Vec<String> = symbols
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        filter.sort();
        filter.dedup();

        db.get_feature_stats(&filter)
    }
}
