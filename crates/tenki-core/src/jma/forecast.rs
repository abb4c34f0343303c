//! Overview forecast document.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

/// Free-text weather overview for one forecast area, valid through the day
/// after tomorrow.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewForecast {
    pub publishing_office: String,
    pub report_datetime: DateTime<FixedOffset>,
    pub target_area: String,
    #[serde(default)]
    pub headline_text: String,
    pub text: String,
}
