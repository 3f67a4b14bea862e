//! Per-channel transcript segmenter: IDLE/OPEN/FLUSH state machine that
//! decides when partials reach the frontend and when accumulated finals
//! close into a document (spec §4.5).

use super::transport::TranscriptEvent;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// In-progress final-text accumulator for one channel.
#[derive(Debug, Clone, Default)]
pub struct PendingDocument {
    pub text: Option<String>,
    pub first_transcript_time: Option<DateTime<Utc>>,
    pub prev_export_time: Option<DateTime<Utc>>,
}

/// One closed document window, ready for the exporter to stamp with
/// `doc_index`/`uuid`/`stream_id` and POST.
#[derive(Debug, Clone)]
pub struct FlushEvent {
    pub text: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_first: bool,
}

#[derive(Debug, Clone)]
pub enum SegmenterOutput {
    /// Nothing to do this tick (duplicate partial, or threshold not met).
    None,
    /// Forward this partial transcript to the frontend.
    Partial(String),
    /// A document window has closed.
    Flush(FlushEvent),
}

/// Drives `IDLE -> OPEN -> FLUSH -> OPEN` per channel. `OPEN -> FLUSH` is
/// checked only on receipt of a final result; a monotonic clock (not
/// wall-clock) is used for the timeout comparison to avoid NTP-skew-induced
/// flushes (spec §9).
pub struct Segmenter {
    min_chars: usize,
    timeout: Duration,
    pending: PendingDocument,
    prev_partial: Option<String>,
    /// `None` until the first document has ever flushed — the timeout check
    /// is short-circuited to false until then, so a slow connect/reconnect
    /// can't masquerade as an elapsed export timeout on the first document.
    last_flush_instant: Option<Instant>,
}

impl Segmenter {
    pub fn new(min_chars: usize, timeout: Duration) -> Self {
        Self {
            min_chars,
            timeout,
            pending: PendingDocument::default(),
            prev_partial: None,
            last_flush_instant: None,
        }
    }

    pub fn on_transcript(&mut self, event: &TranscriptEvent) -> SegmenterOutput {
        if event.text.is_empty() {
            return SegmenterOutput::None;
        }
        if event.is_final {
            self.on_final(event)
        } else {
            self.on_partial(event)
        }
    }

    fn on_partial(&mut self, event: &TranscriptEvent) -> SegmenterOutput {
        if self.pending.first_transcript_time.is_none() {
            self.pending.first_transcript_time = Some(event.received_at);
        }
        if self.prev_partial.as_deref() == Some(event.text.as_str()) {
            return SegmenterOutput::None;
        }
        self.prev_partial = Some(event.text.clone());
        SegmenterOutput::Partial(event.text.clone())
    }

    fn on_final(&mut self, event: &TranscriptEvent) -> SegmenterOutput {
        if self.pending.first_transcript_time.is_none() {
            self.pending.first_transcript_time = Some(event.received_at);
        }

        self.pending.text = Some(match self.pending.text.take() {
            Some(t) if !t.is_empty() => format!("{t} {}", event.text),
            _ => event.text.clone(),
        });

        let accumulated_len = self.pending.text.as_ref().map_or(0, |t| t.len());
        let hit_chars = accumulated_len >= self.min_chars;
        let hit_timeout = self
            .last_flush_instant
            .is_some_and(|t| t.elapsed() >= self.timeout);

        if hit_chars || hit_timeout {
            self.flush(event.received_at)
        } else {
            SegmenterOutput::None
        }
    }

    /// Closes the pending document. Advances state unconditionally, before
    /// the exporter's POST is even attempted — a POST failure therefore
    /// loses this document's text but preserves window continuity (spec
    /// §4.6/§9's documented loss-over-duplication contract).
    fn flush(&mut self, now: DateTime<Utc>) -> SegmenterOutput {
        let start_time = self
            .pending
            .prev_export_time
            .or(self.pending.first_transcript_time)
            .unwrap_or(now);
        let is_first = self.pending.prev_export_time.is_none();
        let text = self.pending.text.take().unwrap_or_default();

        self.pending.prev_export_time = Some(now);
        self.pending.first_transcript_time = None;
        self.last_flush_instant = Some(Instant::now());

        SegmenterOutput::Flush(FlushEvent {
            text,
            start_time,
            end_time: now,
            is_first,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript(text: &str, is_final: bool, at: DateTime<Utc>) -> TranscriptEvent {
        TranscriptEvent {
            channel_id: 0,
            text: text.to_string(),
            is_final,
            received_at: at,
        }
    }

    #[test]
    fn repeated_identical_partials_dedup() {
        let mut seg = Segmenter::new(1000, Duration::from_secs(30));
        let now = Utc::now();
        assert!(matches!(
            seg.on_transcript(&transcript("hi", false, now)),
            SegmenterOutput::Partial(_)
        ));
        assert!(matches!(
            seg.on_transcript(&transcript("hi", false, now)),
            SegmenterOutput::None
        ));
    }

    #[test]
    fn finals_accumulate_space_joined_until_char_threshold() {
        let mut seg = Segmenter::new(10, Duration::from_secs(3600));
        let now = Utc::now();
        assert!(matches!(
            seg.on_transcript(&transcript("hi", true, now)),
            SegmenterOutput::None
        ));
        match seg.on_transcript(&transcript("there friend", true, now)) {
            SegmenterOutput::Flush(flush) => assert_eq!(flush.text, "hi there friend"),
            other => panic!("expected flush, got {other:?}"),
        }
    }

    #[test]
    fn second_document_start_equals_first_document_end() {
        let mut seg = Segmenter::new(1, Duration::from_secs(3600));
        let t0 = Utc::now();
        let first = match seg.on_transcript(&transcript("one", true, t0)) {
            SegmenterOutput::Flush(f) => f,
            _ => panic!("expected flush"),
        };
        assert!(first.is_first);

        let t1 = t0 + chrono::Duration::seconds(5);
        let second = match seg.on_transcript(&transcript("two", true, t1)) {
            SegmenterOutput::Flush(f) => f,
            _ => panic!("expected flush"),
        };
        assert_eq!(second.start_time, first.end_time);
        assert!(!second.is_first);
    }

    #[test]
    fn timeout_cannot_fire_before_the_first_document_ever_flushes() {
        // An unreachable char threshold and a timeout so short it has
        // already elapsed by construction; without the first-flush guard
        // this final would close on the (bogus) timeout alone.
        let mut seg = Segmenter::new(1000, Duration::from_nanos(1));
        std::thread::sleep(Duration::from_millis(5));
        let now = Utc::now();
        assert!(matches!(
            seg.on_transcript(&transcript("short", true, now)),
            SegmenterOutput::None
        ));
    }
}
