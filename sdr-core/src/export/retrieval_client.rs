//! Blocking HTTP client for the retrieval store's `/init` and `/add_doc`
//! endpoints (spec §4.6/§6).

use super::document::Document;
use crate::errors::ExportError;
use serde::Serialize;
use std::thread;
use std::time::Duration;

const INIT_MAX_ATTEMPTS: u32 = 10;
const INIT_BACKOFF: Duration = Duration::from_secs(10);
const ADD_DOC_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct InitRequest<'a> {
    uuid: &'a str,
}

/// Talks to the retrieval store. One instance is shared by every channel's
/// ASR worker after the bootstrapping `init` call succeeds.
pub struct RetrievalClient {
    base_uri: String,
    http: reqwest::blocking::Client,
}

impl RetrievalClient {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            http: reqwest::blocking::Client::new(),
        }
    }

    /// Bootstraps the retrieval store with the process-wide RAG uuid.
    /// Retried up to [`INIT_MAX_ATTEMPTS`] times with a fixed 10-second
    /// backoff; gives up loudly since without `/init` nothing downstream
    /// can work.
    pub fn init(&self, uuid: &str) -> Result<(), ExportError> {
        let url = format!("{}/init", self.base_uri);
        let mut last_reason = String::new();

        for attempt in 1..=INIT_MAX_ATTEMPTS {
            match self.http.post(&url).json(&InitRequest { uuid }).send() {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                Ok(resp) => last_reason = format!("status {}", resp.status()),
                Err(e) => last_reason = e.to_string(),
            }
            log::warn!(
                "retrieval: /init attempt {attempt}/{INIT_MAX_ATTEMPTS} failed: {last_reason}"
            );
            if attempt < INIT_MAX_ATTEMPTS {
                thread::sleep(INIT_BACKOFF);
            }
        }

        Err(ExportError::InitFailed {
            attempts: INIT_MAX_ATTEMPTS,
            reason: last_reason,
        })
    }

    /// Posts one document. Transcripts are high-volume; duplication is
    /// worse than loss, so a failure here is logged and dropped, never
    /// retried — the caller's segmenter state has already advanced.
    pub fn add_doc(&self, doc: &Document) {
        let url = format!("{}/add_doc", self.base_uri);
        let result = self
            .http
            .post(&url)
            .timeout(ADD_DOC_TIMEOUT)
            .json(doc)
            .send();

        match result {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => log::warn!(
                "retrieval: /add_doc for stream {} doc_index {} returned {}",
                doc.stream_id,
                doc.doc_index,
                resp.status()
            ),
            Err(e) => log::warn!(
                "retrieval: /add_doc for stream {} doc_index {} failed: {e}",
                doc.stream_id,
                doc.doc_index
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_uri_is_stored_verbatim() {
        let client = RetrievalClient::new("http://localhost:9000");
        assert_eq!(client.base_uri, "http://localhost:9000");
    }
}
