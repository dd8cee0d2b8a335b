//! Webhook request handling.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Local;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::header::{ALLOW, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use tracing::{debug, warn};

use crate::alert::{Alert, AlertPayload};
use crate::record::LogRecord;
use crate::writer::LogWriter;

/// Routes webhook requests and turns their alerts into log records.
///
/// Write failures never change the response; a request that decodes is
/// always answered with `200 OK`.
#[derive(Debug, Clone)]
pub struct AlertHandler {
    path: &'static str,
    writer: Arc<LogWriter>,
    read_timeout: Duration,
}

impl AlertHandler {
    /// Create a handler serving `path` and appending through `writer`.
    #[must_use]
    pub fn new(path: &'static str, writer: Arc<LogWriter>, read_timeout: Duration) -> Self {
        Self {
            path,
            writer,
            read_timeout,
        }
    }

    /// The writer records are appended through.
    pub fn writer(&self) -> &Arc<LogWriter> {
        &self.writer
    }

    /// Handle one HTTP request.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Display,
    {
        if req.uri().path() != self.path {
            debug!(path = %req.uri().path(), "no route");
            return empty_response(StatusCode::NOT_FOUND);
        }
        if req.method() != Method::POST {
            debug!(method = %req.method(), "method not allowed");
            let mut response = empty_response(StatusCode::METHOD_NOT_ALLOWED);
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("POST"));
            return response;
        }

        self.receive_alerts(req.into_body()).await
    }

    async fn receive_alerts<B>(&self, body: B) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Display,
    {
        let body = match tokio::time::timeout(self.read_timeout, body.collect()).await {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(err)) => {
                debug!(error = %err, "failed to read request body");
                return empty_response(StatusCode::BAD_REQUEST);
            }
            Err(_) => {
                debug!(timeout = ?self.read_timeout, "timed out reading request body");
                return empty_response(StatusCode::BAD_REQUEST);
            }
        };

        let payload = match AlertPayload::from_json(&body) {
            Ok(payload) => payload,
            Err(err) => {
                debug!(error = %err, bytes = body.len(), "malformed alert payload");
                return empty_response(StatusCode::BAD_REQUEST);
            }
        };

        debug!(alerts = payload.len(), "received alerts");
        if payload.is_empty() {
            return empty_response(StatusCode::OK);
        }

        let writer = Arc::clone(&self.writer);
        let task = tokio::task::spawn_blocking(move || record_alerts(&writer, &payload.alerts));
        match task.await {
            Ok(written) => debug!(written, "alerts recorded"),
            Err(err) => warn!(error = %err, "alert recording task failed"),
        }

        empty_response(StatusCode::OK)
    }
}

/// Append one record per alert, in order, taking the clock per alert.
///
/// A failed append is logged and skipped. Returns the number of records
/// written.
pub fn record_alerts(writer: &LogWriter, alerts: &[Alert]) -> usize {
    let mut written = 0;
    for alert in alerts {
        let now = Local::now();
        let record = LogRecord::from_alert(alert, now);
        match writer.append(&record, now.date_naive()) {
            Ok(_) => written += 1,
            Err(err) => warn!(
                error = %err,
                kpi = %record.kpi,
                failed_writes = writer.failed_writes(),
                "dropping alert log record"
            ),
        }
    }
    written
}

fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}
