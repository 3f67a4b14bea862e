//! Per-channel ASR worker thread: drains the channel's PCM FIFO into a
//! streaming session, runs transcript events through the segmenter, and
//! reconnects on any transport error (spec §4.5).

use super::segmenter::{Segmenter, SegmenterOutput};
use super::transport::{AsrTransport, StreamingConfig};
use crate::dsp::PcmChunk;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(200);
const BACKOFF_STEP: Duration = Duration::from_millis(100);

pub struct AsrWorkerConfig {
    pub channel_id: usize,
    pub streaming: StreamingConfig,
    /// How long a FIFO may sit empty before the session is torn down.
    /// Preserved as specified even though an idle channel simply stops
    /// transcribing until new audio arrives and a session is reopened.
    pub idle_timeout: Duration,
    pub reconnect_backoff: Duration,
    pub min_db_export_chars: usize,
    pub db_export_timeout: Duration,
}

/// Owns the worker thread; dropping without calling [`shutdown`] detaches
/// the thread rather than blocking, so callers that want a clean join must
/// call it explicitly.
pub struct AsrWorker {
    handle: Option<JoinHandle<()>>,
    kill: Arc<AtomicBool>,
}

impl AsrWorker {
    pub fn spawn<F, G>(
        cfg: AsrWorkerConfig,
        fifo: Receiver<PcmChunk>,
        transport: Arc<dyn AsrTransport>,
        on_partial: F,
        on_flush: G,
    ) -> Self
    where
        F: Fn(usize, String) + Send + 'static,
        G: Fn(usize, super::segmenter::FlushEvent) + Send + 'static,
    {
        let kill = Arc::new(AtomicBool::new(false));
        let kill_thread = kill.clone();
        let channel_id = cfg.channel_id;
        let handle = thread::Builder::new()
            .name(format!("asr-worker-{channel_id}"))
            .spawn(move || run(cfg, fifo, transport, kill_thread, on_partial, on_flush))
            .expect("failed to spawn asr worker thread");
        Self {
            handle: Some(handle),
            kill,
        }
    }

    /// Signals the worker to stop and blocks until its thread exits.
    pub fn shutdown(mut self) {
        self.kill.store(true, Ordering::SeqCst);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

fn sleep_respecting_kill(duration: Duration, kill: &AtomicBool) {
    let mut waited = Duration::ZERO;
    while waited < duration {
        if kill.load(Ordering::Relaxed) {
            return;
        }
        let step = BACKOFF_STEP.min(duration - waited);
        thread::sleep(step);
        waited += step;
    }
}

fn run<F, G>(
    cfg: AsrWorkerConfig,
    fifo: Receiver<PcmChunk>,
    transport: Arc<dyn AsrTransport>,
    kill: Arc<AtomicBool>,
    on_partial: F,
    on_flush: G,
) where
    F: Fn(usize, String),
    G: Fn(usize, super::segmenter::FlushEvent),
{
    let channel_id = cfg.channel_id;
    let mut segmenter = Segmenter::new(cfg.min_db_export_chars, cfg.db_export_timeout);

    'sessions: while !kill.load(Ordering::Relaxed) {
        let mut session = match transport.start_session(channel_id, cfg.streaming.clone()) {
            Ok(session) => session,
            Err(e) => {
                log::warn!(
                    "asr[{channel_id}]: connect failed: {e}, retrying in {:?}",
                    cfg.reconnect_backoff
                );
                sleep_respecting_kill(cfg.reconnect_backoff, &kill);
                continue 'sessions;
            }
        };
        log::info!("asr[{channel_id}]: session established");
        let mut last_audio = Instant::now();

        while !kill.load(Ordering::Relaxed) {
            match fifo.recv_timeout(POLL_INTERVAL) {
                Ok(chunk) => {
                    last_audio = Instant::now();
                    if let Err(e) = session.send_audio(&chunk.bytes) {
                        log::warn!("asr[{channel_id}]: send_audio failed: {e}, reconnecting");
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    log::info!("asr[{channel_id}]: pcm fifo closed, shutting down worker");
                    break 'sessions;
                }
            }

            if last_audio.elapsed() >= cfg.idle_timeout {
                log::warn!(
                    "asr[{channel_id}]: fifo idle for {:?}, ending session",
                    cfg.idle_timeout
                );
                break;
            }

            match session.try_recv(Duration::from_millis(0)) {
                Ok(Some(event)) => match segmenter.on_transcript(&event) {
                    SegmenterOutput::Partial(text) => on_partial(channel_id, text),
                    SegmenterOutput::Flush(flush) => on_flush(channel_id, flush),
                    SegmenterOutput::None => {}
                },
                Ok(None) => {}
                Err(e) => {
                    log::warn!("asr[{channel_id}]: recv failed: {e}, reconnecting");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asr::mock::MockAsrTransport;
    use chrono::Utc;
    use crossbeam_channel::unbounded;
    use parking_lot::Mutex;

    fn streaming_config() -> StreamingConfig {
        StreamingConfig {
            src_lang_code: "en-US".to_string(),
            automatic_punctuation: true,
            verbatim_transcripts: false,
            sample_rate_hz: 16000,
        }
    }

    #[test]
    fn forwards_partial_and_flushes_final() {
        let transport = Arc::new(MockAsrTransport::new());
        transport.push_event(
            0,
            super::super::transport::TranscriptEvent {
                channel_id: 0,
                text: "hello".to_string(),
                is_final: false,
                received_at: Utc::now(),
            },
        );
        transport.push_event(
            0,
            super::super::transport::TranscriptEvent {
                channel_id: 0,
                text: "hello world".to_string(),
                is_final: true,
                received_at: Utc::now(),
            },
        );

        let (_tx, rx) = unbounded::<PcmChunk>();
        let partials: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let flushes: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let partials_clone = partials.clone();
        let flushes_clone = flushes.clone();

        let cfg = AsrWorkerConfig {
            channel_id: 0,
            streaming: streaming_config(),
            idle_timeout: Duration::from_secs(30),
            reconnect_backoff: Duration::from_millis(50),
            min_db_export_chars: 1,
            db_export_timeout: Duration::from_secs(3600),
        };

        let worker = AsrWorker::spawn(
            cfg,
            rx,
            transport,
            move |_ch, text| partials_clone.lock().push(text),
            move |_ch, flush| flushes_clone.lock().push(flush.text),
        );

        thread::sleep(Duration::from_millis(300));
        worker.shutdown();

        assert_eq!(partials.lock().as_slice(), &["hello".to_string()]);
        assert_eq!(flushes.lock().as_slice(), &["hello world".to_string()]);
    }

    #[test]
    fn reconnects_after_scripted_connect_failure() {
        let transport = Arc::new(MockAsrTransport::new());
        transport.fail_next_connect();
        transport.push_event(
            0,
            super::super::transport::TranscriptEvent {
                channel_id: 0,
                text: "recovered".to_string(),
                is_final: true,
                received_at: Utc::now(),
            },
        );

        let (_tx, rx) = unbounded::<PcmChunk>();
        let flushes: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let flushes_clone = flushes.clone();

        let cfg = AsrWorkerConfig {
            channel_id: 0,
            streaming: streaming_config(),
            idle_timeout: Duration::from_secs(30),
            reconnect_backoff: Duration::from_millis(20),
            min_db_export_chars: 1,
            db_export_timeout: Duration::from_secs(3600),
        };

        let worker = AsrWorker::spawn(cfg, rx, transport, |_, _| {}, move |_ch, flush| {
            flushes_clone.lock().push(flush.text)
        });

        thread::sleep(Duration::from_millis(300));
        worker.shutdown();

        assert_eq!(flushes.lock().as_slice(), &["recovered".to_string()]);
    }
}
