//! Blocking, fire-and-forget HTTP client for the frontend's live partial
//! transcript feed (spec §4.6/§6).

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

const UPDATE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Serialize)]
struct UpdateDataStreamRequest<'a> {
    text: &'a str,
    stream_id: &'a str,
    timestamp: &'a str,
    finalized: bool,
    uuid: Option<&'a str>,
}

/// Posts live partial transcripts to the frontend. Failures are logged and
/// otherwise ignored — the frontend feed is best-effort, never a source of
/// backpressure on the ASR worker.
pub struct FrontendClient {
    base_uri: String,
    http: reqwest::blocking::Client,
}

impl FrontendClient {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            http: reqwest::blocking::Client::new(),
        }
    }

    /// `finalized` is always `false` and `uuid` is always absent here: only
    /// partial transcripts flow through this endpoint, per spec §6, and
    /// partials carry no document uuid (that's assigned only on flush).
    pub fn post_partial(&self, text: &str, channel_id: usize, timestamp: DateTime<Utc>) {
        let stream_id = super::document::stream_id(channel_id);
        let timestamp = crate::clock::frontend_timestamp(timestamp);
        let url = format!("{}/api/update-data-stream", self.base_uri);
        let body = UpdateDataStreamRequest {
            text,
            stream_id: &stream_id,
            timestamp: &timestamp,
            finalized: false,
            uuid: None,
        };

        let result = self
            .http
            .post(&url)
            .timeout(UPDATE_TIMEOUT)
            .json(&body)
            .send();

        if let Err(e) = result {
            log::warn!("frontend: update-data-stream for {stream_id} failed: {e}");
        }
    }
}
