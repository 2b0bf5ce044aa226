//! Static field catalogs for the stored record types
//!
//! The catalogs are the single source of column names. SQL generated anywhere
//! in the crate only interpolates identifiers taken from these tables.

use serde::Serialize;

/// Storage/wire type of a catalog field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Float,
    Integer,
    Boolean,
    Timestamp,
}

impl FieldKind {
    /// SQLite column type used in migrations
    pub fn sql_type(self) -> &'static str {
        match self {
            FieldKind::Text | FieldKind::Timestamp => "TEXT",
            FieldKind::Float => "REAL",
            FieldKind::Integer | FieldKind::Boolean => "INTEGER",
        }
    }
}

/// One named, typed field of a record schema
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub required: bool,
    /// Whether the field carries signal for downstream model training
    pub model_useful: bool,
    #[serde(skip)]
    pub aliases: &'static [&'static str],
}

const fn key_text(name: &'static str) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Text, required: true, model_useful: true, aliases: &[] }
}

const fn required(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind, required: true, model_useful: true, aliases: &[] }
}

const fn optional(name: &'static str, kind: FieldKind, model_useful: bool) -> FieldSpec {
    FieldSpec { name, kind, required: false, model_useful, aliases: &[] }
}

/// Schema of one stored record type
#[derive(Debug)]
pub struct RecordSchema {
    pub table: &'static str,
    pub symbol_field: &'static str,
    pub time_field: &'static str,
    pub fields: &'static [FieldSpec],
}

impl RecordSchema {
    /// Look up a field by its canonical name
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Resolve a canonical name or alias
    pub fn resolve(&self, key: &str) -> Option<&'static FieldSpec> {
        self.fields
            .iter()
            .find(|f| f.name == key || f.aliases.contains(&key))
    }
}

use FieldKind::*;

pub const FEATURES: RecordSchema = RecordSchema {
    table: "model_features",
    symbol_field: "symbol",
    time_field: "datetime",
    fields: &[
        key_text("symbol"),
        FieldSpec {
            name: "datetime",
            kind: Timestamp,
            required: true,
            model_useful: true,
            aliases: &["ts", "timestamp"],
        },
        optional("price", Float, true),
        optional("market_cap", Float, true),
        optional("beta", Float, true),
        optional("last_dividend", Float, true),
        optional("range", Text, false),
        optional("change", Float, true),
        optional("change_percentage", Float, true),
        optional("volume", Integer, true),
        optional("average_volume", Integer, true),
        optional("company_name", Text, false),
        optional("currency", Text, false),
        optional("cik", Text, false),
        optional("isin", Text, false),
        optional("cusip", Text, false),
        optional("exchange_full_name", Text, false),
        optional("exchange", Text, true),
        optional("industry", Text, true),
        optional("website", Text, false),
        optional("description", Text, false),
        optional("ceo", Text, false),
        optional("sector", Text, true),
        optional("country", Text, true),
        optional("full_time_employees", Text, false),
        optional("phone", Text, false),
        optional("address", Text, false),
        optional("city", Text, false),
        optional("state", Text, false),
        optional("zip", Text, false),
        optional("image", Text, false),
        optional("ipo_date", Text, true),
        optional("default_image", Boolean, false),
        optional("is_etf", Boolean, true),
        optional("is_actively_trading", Boolean, true),
        optional("is_adr", Boolean, true),
        optional("is_fund", Boolean, true),
    ],
};

/// Compact subset suggested for training pipelines
pub const RECOMMENDED_FEATURES: &[&str] = &[
    "symbol",
    "datetime",
    "price",
    "change_percentage",
    "volume",
    "average_volume",
    "market_cap",
    "beta",
    "sector",
    "industry",
    "is_etf",
];

pub const MARKET_DATA: RecordSchema = RecordSchema {
    table: "market_data",
    symbol_field: "symbol",
    time_field: "ts",
    fields: &[
        key_text("symbol"),
        required("ts", Timestamp),
        required("open", Float),
        required("high", Float),
        required("low", Float),
        required("close", Float),
        required("volume", Integer),
        required("vwap", Float),
    ],
};
