//! In-memory ASR transport driving the end-to-end test scenarios of
//! spec §8 without a live ASR endpoint.

use super::transport::{AsrSession, AsrTransport, StreamingConfig, TranscriptEvent};
use crate::errors::AsrError;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct MockState {
    scripts: HashMap<usize, VecDeque<TranscriptEvent>>,
    sent_audio: HashMap<usize, Vec<Vec<u8>>>,
}

/// A scripted transport: each channel has a queue of canned
/// [`TranscriptEvent`]s delivered in order on successive `try_recv` calls.
/// `fail_next_connect` simulates a disconnect for reconnect-recovery tests.
pub struct MockAsrTransport {
    state: Arc<Mutex<MockState>>,
    fail_next_connect: AtomicBool,
}

impl MockAsrTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            fail_next_connect: AtomicBool::new(false),
        }
    }

    pub fn push_event(&self, channel_id: usize, event: TranscriptEvent) {
        self.state
            .lock()
            .scripts
            .entry(channel_id)
            .or_default()
            .push_back(event);
    }

    pub fn fail_next_connect(&self) {
        self.fail_next_connect.store(true, Ordering::SeqCst);
    }

    pub fn sent_audio(&self, channel_id: usize) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .sent_audio
            .get(&channel_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for MockAsrTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl AsrTransport for MockAsrTransport {
    fn start_session(&self, channel_id: usize, _cfg: StreamingConfig) -> Result<Box<dyn AsrSession>, AsrError> {
        if self.fail_next_connect.swap(false, Ordering::SeqCst) {
            return Err(AsrError::ConnectFailed {
                reason: "mock: scripted connect failure".to_string(),
            });
        }
        Ok(Box::new(MockAsrSession {
            channel_id,
            state: self.state.clone(),
        }))
    }
}

struct MockAsrSession {
    channel_id: usize,
    state: Arc<Mutex<MockState>>,
}

impl AsrSession for MockAsrSession {
    fn send_audio(&mut self, pcm: &[u8]) -> Result<(), AsrError> {
        self.state
            .lock()
            .sent_audio
            .entry(self.channel_id)
            .or_default()
            .push(pcm.to_vec());
        Ok(())
    }

    fn try_recv(&mut self, _timeout: Duration) -> Result<Option<TranscriptEvent>, AsrError> {
        Ok(self
            .state
            .lock()
            .scripts
            .get_mut(&self.channel_id)
            .and_then(|q| q.pop_front()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(text: &str, is_final: bool) -> TranscriptEvent {
        TranscriptEvent {
            channel_id: 0,
            text: text.to_string(),
            is_final,
            received_at: Utc::now(),
        }
    }

    #[test]
    fn delivers_scripted_events_in_order() {
        let transport = MockAsrTransport::new();
        transport.push_event(0, event("hello", false));
        transport.push_event(0, event("hello world", true));

        let mut session = transport
            .start_session(0, StreamingConfig {
                src_lang_code: "en-US".to_string(),
                automatic_punctuation: true,
                verbatim_transcripts: false,
                sample_rate_hz: 16000,
            })
            .unwrap();

        let first = session.try_recv(Duration::from_millis(1)).unwrap().unwrap();
        assert_eq!(first.text, "hello");
        assert!(!first.is_final);
        let second = session.try_recv(Duration::from_millis(1)).unwrap().unwrap();
        assert!(second.is_final);
    }

    #[test]
    fn scripted_connect_failure_errors_once() {
        let transport = MockAsrTransport::new();
        transport.fail_next_connect();
        let cfg = StreamingConfig {
            src_lang_code: "en-US".to_string(),
            automatic_punctuation: true,
            verbatim_transcripts: false,
            sample_rate_hz: 16000,
        };
        assert!(transport.start_session(0, cfg.clone()).is_err());
        assert!(transport.start_session(0, cfg).is_ok());
    }
}
