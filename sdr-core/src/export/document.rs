//! The `Document` wire type and the process-wide index counter (spec §3).

use crate::asr::FlushEvent;
use crate::clock::{ntp_formats, ntp_pts};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One batched contribution to the retrieval store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub document: String,
    pub doc_index: u64,
    pub stream_id: String,
    pub start_ntp: String,
    pub end_ntp: String,
    pub start_ntp_float: f64,
    pub end_ntp_float: f64,
    pub start_pts: i64,
    pub end_pts: i64,
    pub uuid: String,
    pub is_first: bool,
    pub is_last: bool,
}

/// Each channel's logical stream id, part of the external contract (spec §6).
pub fn stream_id(channel_id: usize) -> String {
    format!("fm-radio-ch{channel_id}")
}

/// Each channel's source URI, part of the external contract (spec §6).
pub fn source_uri(channel_id: usize) -> String {
    format!("rtsp://fm-radio-ch{channel_id}")
}

/// Process-wide strictly-increasing `doc_index`, reserved before the POST so
/// gaps in the downstream store are possible and expected on failed sends.
#[derive(Clone, Default)]
pub struct DocIndexCounter(Arc<AtomicU64>);

impl DocIndexCounter {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU64::new(0)))
    }

    pub fn reserve(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

/// Builds the wire `Document` from a closed segmenter window. `is_last` is
/// set by the caller, since only the exporter/worker knows a channel is
/// shutting down. Each document gets its own freshly generated uuid — the
/// process-wide RAG bootstrap uuid used by `RetrievalClient::init` is a
/// separate identity and is never reused here.
pub fn build_document(
    flush: FlushEvent,
    channel_id: usize,
    counter: &DocIndexCounter,
    is_last: bool,
) -> Document {
    let (start_ntp, start_ntp_float) = ntp_formats(flush.start_time);
    let (end_ntp, end_ntp_float) = ntp_formats(flush.end_time);

    Document {
        document: flush.text,
        doc_index: counter.reserve(),
        stream_id: stream_id(channel_id),
        start_ntp,
        end_ntp,
        start_ntp_float,
        end_ntp_float,
        start_pts: ntp_pts(flush.start_time),
        end_pts: ntp_pts(flush.end_time),
        uuid: uuid::Uuid::new_v4().to_string(),
        is_first: flush.is_first,
        is_last,
    }
}
