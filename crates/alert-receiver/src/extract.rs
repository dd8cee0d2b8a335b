//! Field extraction with fallback defaults.
//!
//! A label or annotation that is missing and one that is present but empty
//! are treated the same: the fallback applies. Extraction never fails.

use crate::alert::Alert;

/// Hostname reported for alerts scoped to the whole cluster.
pub const CLUSTER_HOSTNAME: &str = "hivemq-cluster";

/// Fallback for hostname and KPI.
pub const UNKNOWN: &str = "unknown";

/// Fallback for IP and count.
pub const NOT_AVAILABLE: &str = "NA";

/// Fallback for summary.
pub const NO_SUMMARY: &str = "no summary";

/// Placeholder metric value written for every alert.
pub const METRIC_VALUE: &str = "1";

/// Return `value` unless it is missing or empty.
pub fn or_fallback<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => fallback,
    }
}

/// Hostname of the alerting machine.
///
/// The `hostname` label wins; `scope=cluster` is only consulted when it is
/// missing or empty.
pub fn hostname(alert: &Alert) -> &str {
    if let Some(host) = alert.label("hostname").filter(|h| !h.is_empty()) {
        return host;
    }
    if alert.label("scope") == Some("cluster") {
        return CLUSTER_HOSTNAME;
    }
    UNKNOWN
}

/// IP (or host) part of the `instance` label.
pub fn ip(alert: &Alert) -> &str {
    let instance = match alert.label("instance") {
        Some(i) if !i.is_empty() => i,
        _ => return NOT_AVAILABLE,
    };

    if let Some((host, _port)) = split_host_port(instance) {
        return host;
    }

    instance.split(':').next().unwrap_or(instance)
}

/// Name of the KPI, taken from `alertname`.
pub fn kpi(alert: &Alert) -> &str {
    or_fallback(alert.label("alertname"), UNKNOWN)
}

/// Current value of the alerting metric, taken from `current_value`.
pub fn count(alert: &Alert) -> &str {
    or_fallback(alert.annotation("current_value"), NOT_AVAILABLE)
}

/// Human readable summary.
pub fn summary(alert: &Alert) -> &str {
    or_fallback(alert.annotation("summary"), NO_SUMMARY)
}

/// Split `host:port` or `[host]:port` into its parts.
///
/// Returns `None` when there is no port separator, when an unbracketed host
/// contains a colon, or when brackets are misplaced. The port may be empty.
pub fn split_host_port(hostport: &str) -> Option<(&str, &str)> {
    let colon = hostport.rfind(':')?;

    // `open` and `close` bound the region that must not contain stray brackets.
    let (host, open, close) = if let Some(rest) = hostport.strip_prefix('[') {
        let end = rest.find(']')? + 1;
        // The closing bracket must be immediately followed by the last colon.
        if end + 1 != colon {
            return None;
        }
        (&hostport[1..end], 1, end + 1)
    } else {
        let host = &hostport[..colon];
        if host.contains(':') {
            return None;
        }
        (host, 0, 0)
    };

    if hostport[open..].contains('[') || hostport[close..].contains(']') {
        return None;
    }

    Some((host, &hostport[colon + 1..]))
}
