//! Schema Service
//!
//! Describes the feature catalog to clients. Served from static data only.

use crate::records::{FieldSpec, FEATURES, RECOMMENDED_FEATURES};
use serde::Serialize;

/// Schema description returned to API clients
#[derive(Debug, Clone, Serialize)]
pub struct SchemaDescription {
    pub table: &'static str,
    pub fields: &'static [FieldSpec],
    pub recommended_fields: &'static [&'static str],
}

/// Schema service for business logic
pub struct SchemaService;

impl SchemaService {
    pub fn describe() -> SchemaDescription {
        SchemaDescription {
            table: FEATURES.table,
            fields: FEATURES.fields,
            recommended_fields: RECOMMENDED_FEATURES,
        }
    }
}
