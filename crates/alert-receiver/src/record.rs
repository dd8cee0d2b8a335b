//! The log line written for each alert.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::alert::Alert;
use crate::error::WriteResult;
use crate::extract;

/// Format of the `ts` field.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One alert rendered as a log record.
///
/// Field order is part of the on-disk format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Local time the alert was processed, `YYYY-MM-DD HH:MM`.
    #[serde(rename = "ts")]
    pub timestamp: String,
    /// IP or host of the alerting instance.
    pub ip: String,
    /// Hostname of the alerting machine.
    #[serde(rename = "hname")]
    pub hostname: String,
    /// Alert name.
    pub kpi: String,
    /// Always `"1"`.
    pub value: String,
    /// Current value of the alerting metric.
    #[serde(rename = "cnt")]
    pub count: String,
    /// Alert summary.
    #[serde(rename = "app_sub_name")]
    pub summary: String,
}

impl LogRecord {
    /// Build the record for `alert` processed at `now`.
    pub fn from_alert(alert: &Alert, now: DateTime<Local>) -> Self {
        Self {
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
            ip: extract::ip(alert).to_string(),
            hostname: extract::hostname(alert).to_string(),
            kpi: extract::kpi(alert).to_string(),
            value: extract::METRIC_VALUE.to_string(),
            count: extract::count(alert).to_string(),
            summary: extract::summary(alert).to_string(),
        }
    }

    /// Serialize to a single newline-terminated JSON line.
    pub fn to_line(&self) -> WriteResult<Vec<u8>> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}
