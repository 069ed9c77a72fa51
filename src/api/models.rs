use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::handlers::ConversionType;
use crate::observability::MetricsSnapshot;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: BTreeMap<String, String>,
    pub version: String,
    pub conversions: MetricsSnapshot,
}

/// One entry of `GET /api/conversions`
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversionInfo {
    pub conversion_type: ConversionType,
    pub accepts: Vec<String>,
}
