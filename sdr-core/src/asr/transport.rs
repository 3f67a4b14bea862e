//! Transport abstraction for the bidirectional streaming ASR session
//! (spec §4.5/§6), so the worker is testable without a live ASR endpoint.

use crate::errors::AsrError;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// First-request streaming configuration (spec §6: LINEAR_PCM, one
/// alternative, no profanity filter, configurable punctuation/verbatim).
#[derive(Debug, Clone)]
pub struct StreamingConfig {
    pub src_lang_code: String,
    pub automatic_punctuation: bool,
    pub verbatim_transcripts: bool,
    pub sample_rate_hz: u32,
}

/// One interim or final recognition result.
#[derive(Debug, Clone)]
pub struct TranscriptEvent {
    pub channel_id: usize,
    pub text: String,
    pub is_final: bool,
    pub received_at: DateTime<Utc>,
}

/// A live bidirectional session with an ASR endpoint.
pub trait AsrSession: Send {
    fn send_audio(&mut self, pcm: &[u8]) -> Result<(), AsrError>;
    fn try_recv(&mut self, timeout: Duration) -> Result<Option<TranscriptEvent>, AsrError>;
}

/// Opens sessions against a concrete ASR backend (gRPC-style or in-memory
/// mock).
pub trait AsrTransport: Send + Sync {
    fn start_session(&self, channel_id: usize, cfg: StreamingConfig) -> Result<Box<dyn AsrSession>, AsrError>;
}
