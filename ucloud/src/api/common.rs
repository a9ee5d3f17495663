//! Common types for UCloud API responses

use serde::{Deserialize, Serialize};

/// Status fields every response carries.
#[derive(Debug, Deserialize)]
pub struct ResponseStatus {
    #[serde(rename = "RetCode")]
    pub ret_code: i64,
    #[serde(rename = "Message", default)]
    pub message: String,
}

/// Body of actions that return nothing beyond the status fields.
#[derive(Debug, Default, Deserialize)]
pub struct NoData {}

/// Renders an optional flag the way UCloud expects it in form parameters.
pub fn enable_flag(enabled: bool) -> &'static str {
    if enabled {
        "enable"
    } else {
        "disable"
    }
}

/// Request body for actions that take a `DomainList`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DomainListRequest<T> {
    pub domain_list: Vec<T>,
}
