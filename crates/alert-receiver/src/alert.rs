//! Alertmanager webhook payload.
//!
//! Decoding is lenient about missing fields and strict about types: absent
//! or `null` fields (and `null` label values) fall back to empty values,
//! while a label that is a number, bool, array or object, or a timestamp
//! that is not RFC 3339, rejects the whole body. Field names also match in
//! their capitalized form (`Alerts`, `Labels`, ...).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// A single alert as posted by the monitoring system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// `firing` or `resolved`; not interpreted by the receiver.
    #[serde(default, alias = "Status", deserialize_with = "null_as_default")]
    pub status: String,
    /// When the alert started firing.
    #[serde(default, alias = "StartsAt")]
    pub starts_at: Option<DateTime<Utc>>,
    /// When the alert resolved, if it has.
    #[serde(default, alias = "EndsAt")]
    pub ends_at: Option<DateTime<Utc>>,
    /// Identifying key-value pairs.
    #[serde(default, alias = "Labels", deserialize_with = "string_map")]
    pub labels: HashMap<String, String>,
    /// Descriptive key-value pairs.
    #[serde(default, alias = "Annotations", deserialize_with = "string_map")]
    pub annotations: HashMap<String, String>,
}

impl Alert {
    /// Look up a label.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }

    /// Look up an annotation.
    pub fn annotation(&self, name: &str) -> Option<&str> {
        self.annotations.get(name).map(String::as_str)
    }
}

/// The body of one webhook request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AlertPayload {
    /// Alerts in the order they were sent.
    #[serde(default, alias = "Alerts", deserialize_with = "null_as_default")]
    pub alerts: Vec<Alert>,
}

impl AlertPayload {
    /// Decode a request body.
    ///
    /// Only the first JSON value is read; anything after it is ignored. A
    /// top-level `null` decodes to an empty payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is empty or its first value does not
    /// have the expected structure.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        let mut values = serde_json::Deserializer::from_slice(body).into_iter::<Option<Self>>();
        match values.next() {
            Some(Ok(payload)) => Ok(payload.unwrap_or_default()),
            Some(Err(err)) => Err(err),
            None => Err(serde_json::Error::custom("empty request body")),
        }
    }

    /// Number of alerts in the payload.
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    /// Whether the payload carries no alerts.
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A string map where a `null` map is empty and a `null` value is `""`.
fn string_map<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let map: HashMap<String, Option<String>> = null_as_default(deserializer)?;
    Ok(map
        .into_iter()
        .map(|(key, value)| (key, value.unwrap_or_default()))
        .collect())
}
