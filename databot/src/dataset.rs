//! DatasetRecord: one accepted resource, shaped for the presentation layer.
//!
//! JSON field names are the presentation contract (`dataset_title`, `dataset_url`, ...).

use serde::{Deserialize, Serialize};

/// Organization label used when the portal gives none.
pub const UNKNOWN_ORGANIZATION: &str = "Unknown";

fn unknown_organization() -> String {
    UNKNOWN_ORGANIZATION.to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRecord {
    /// Portal root the record was found on.
    #[serde(rename = "dataset_source", default)]
    pub source: String,
    #[serde(rename = "dataset_title")]
    pub title: String,
    /// Resource creation date (`YYYY-MM-DD` when parseable, raw otherwise).
    #[serde(rename = "dataset_date", default)]
    pub date: String,
    #[serde(rename = "dataset_description", default)]
    pub description: String,
    #[serde(rename = "dataset_organization", default = "unknown_organization")]
    pub organization: String,
    /// Direct download URL of the resource in the wanted format.
    #[serde(rename = "dataset_url")]
    pub url: String,
}

/// Normalizes a portal `created_at` to a calendar date. Unparseable input is returned as is.
pub fn display_date(created_at: &str) -> String {
    let raw = created_at.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}
