use super::catalog::{RecordSchema, FEATURES};
use super::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One market/feature observation for the `model_features` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub symbol: String,
    pub datetime: DateTime<Utc>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub beta: Option<f64>,
    #[serde(default)]
    pub last_dividend: Option<f64>,
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub change_percentage: Option<f64>,
    #[serde(default)]
    pub volume: Option<i64>,
    #[serde(default)]
    pub average_volume: Option<i64>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub cik: Option<String>,
    #[serde(default)]
    pub isin: Option<String>,
    #[serde(default)]
    pub cusip: Option<String>,
    #[serde(default)]
    pub exchange_full_name: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ceo: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub full_time_employees: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub ipo_date: Option<String>,
    #[serde(default)]
    pub default_image: Option<bool>,
    #[serde(default)]
    pub is_etf: Option<bool>,
    #[serde(default)]
    pub is_actively_trading: Option<bool>,
    #[serde(default)]
    pub is_adr: Option<bool>,
    #[serde(default)]
    pub is_fund: Option<bool>,
}

impl Record for FeatureRecord {
    const SCHEMA: &'static RecordSchema = &FEATURES;

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn instant(&self) -> DateTime<Utc> {
        self.datetime
    }
}
