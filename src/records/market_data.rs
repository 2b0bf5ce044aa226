use super::catalog::{RecordSchema, MARKET_DATA};
use super::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV bar for the `market_data` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDataItem {
    pub symbol: String,
    pub ts: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub vwap: f64,
}

impl Record for MarketDataItem {
    const SCHEMA: &'static RecordSchema = &MARKET_DATA;

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn instant(&self) -> DateTime<Utc> {
        self.ts
    }
}
