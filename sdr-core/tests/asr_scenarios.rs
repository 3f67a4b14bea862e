//! End-to-end scenarios from spec §8, driven against `MockAsrTransport`
//! rather than a live ASR endpoint.

use chrono::Utc;
use crossbeam_channel::{bounded, unbounded};
use parking_lot::Mutex;
use sdr_core::asr::{AsrWorker, AsrWorkerConfig, FlushEvent, MockAsrTransport, StreamingConfig};
use sdr_core::dsp::PcmChunk;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn streaming_config() -> StreamingConfig {
    StreamingConfig {
        src_lang_code: "en-US".to_string(),
        automatic_punctuation: true,
        verbatim_transcripts: false,
        sample_rate_hz: 16_000,
    }
}

fn transcript(channel_id: usize, text: &str, is_final: bool) -> sdr_core::asr::TranscriptEvent {
    sdr_core::asr::TranscriptEvent {
        channel_id,
        text: text.to_string(),
        is_final,
        received_at: Utc::now(),
    }
}

/// Scenario 3: a scripted connect failure (forced disconnect) is followed
/// by a successful reconnect, and no document is lost — the final text
/// that arrives after reconnection still reaches the flush callback.
#[test]
fn asr_disconnect_then_reconnect_loses_no_pending_document() {
    let transport = Arc::new(MockAsrTransport::new());
    transport.fail_next_connect();
    transport.push_event(0, transcript(0, "hello", true));
    transport.push_event(0, transcript(0, "world", true));

    let (_tx, rx) = unbounded::<PcmChunk>();
    let flushes: Arc<Mutex<Vec<FlushEvent>>> = Arc::new(Mutex::new(Vec::new()));
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
        flushes_clone.lock().push(flush)
    });

    // Each queued final is drained on its own ~200ms fifo-poll tick, so two
    // finals need a full two ticks (plus the reconnect backoff) to land.
    thread::sleep(Duration::from_millis(600));
    worker.shutdown();

    let flushed = flushes.lock();
    assert_eq!(flushed.len(), 2);
    assert_eq!(flushed[0].text, "hello");
    assert_eq!(flushed[1].text, "world");
    // Window contiguity survives the reconnect.
    assert_eq!(flushed[1].start_time, flushed[0].end_time);
}

/// Scenario 6: a high timeout (5s real, scaled to 150ms here) with a high
/// character threshold produces one flush per timeout tick when each final
/// is far below the threshold; a stream of large finals instead produces
/// threshold-triggered flushes, independent of the timer.
#[test]
fn char_threshold_flush_fires_before_timeout_under_high_rate() {
    let transport = Arc::new(MockAsrTransport::new());
    // Three finals that individually clear the 20-char threshold.
    transport.push_event(0, transcript(0, &"x".repeat(25), true));
    transport.push_event(0, transcript(0, &"y".repeat(25), true));

    let (_tx, rx) = unbounded::<PcmChunk>();
    let flushes: Arc<Mutex<Vec<FlushEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let flushes_clone = flushes.clone();

    let cfg = AsrWorkerConfig {
        channel_id: 0,
        streaming: streaming_config(),
        idle_timeout: Duration::from_secs(30),
        reconnect_backoff: Duration::from_millis(20),
        min_db_export_chars: 20,
        db_export_timeout: Duration::from_secs(3600), // timer never fires in this test
    };

    let worker = AsrWorker::spawn(cfg, rx, transport, |_, _| {}, move |_ch, flush| {
        flushes_clone.lock().push(flush)
    });

    // Each queued final is only drained on its own ~200ms fifo-poll tick, so
    // two finals need two ticks' worth of wall clock to both land.
    thread::sleep(Duration::from_millis(600));
    worker.shutdown();

    // Both finals independently clear the character threshold, so each
    // produces its own flush rather than waiting for the (very long) timer.
    assert_eq!(flushes.lock().len(), 2);
}

#[test]
fn timeout_flush_fires_when_char_threshold_is_unreachable() {
    // The timeout check is suppressed until a first document has ever
    // flushed (spec's "no timeout before the first export" guard), so this
    // scenario needs a char-threshold-triggered first flush to seed the
    // timeout baseline before a second, short final can flush on timeout.
    let transport = Arc::new(MockAsrTransport::new());
    transport.push_event(0, transcript(0, &"x".repeat(25), true));
    transport.push_event(0, transcript(0, "short", true));

    let (_tx, rx) = unbounded::<PcmChunk>();
    let flushes: Arc<Mutex<Vec<FlushEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let flushes_clone = flushes.clone();

    let cfg = AsrWorkerConfig {
        channel_id: 0,
        streaming: streaming_config(),
        idle_timeout: Duration::from_secs(30),
        reconnect_backoff: Duration::from_millis(20),
        min_db_export_chars: 20, // the first final alone clears this
        db_export_timeout: Duration::from_millis(150),
    };

    let worker = AsrWorker::spawn(cfg, rx, transport, |_, _| {}, move |_ch, flush| {
        flushes_clone.lock().push(flush)
    });

    // Two ~200ms poll ticks to drain both finals, comfortably past the
    // 150ms timeout between the first flush and the second final arriving.
    thread::sleep(Duration::from_millis(600));
    worker.shutdown();

    let flushed = flushes.lock();
    assert_eq!(flushed.len(), 2);
    assert_eq!(flushed[0].text, "x".repeat(25));
    assert_eq!(flushed[1].text, "short");
}

/// Scenario 5: a bounded PCM FIFO that fills while the worker is busy
/// (simulated here by a slow consumer draining into the worker) exerts
/// backpressure on the producer without losing any chunk, and drains
/// cleanly once the worker resumes.
#[test]
fn bounded_pcm_fifo_exerts_backpressure_without_dropping_chunks() {
    let transport = Arc::new(MockAsrTransport::new());
    let (tx, rx) = bounded::<PcmChunk>(4);

    let cfg = AsrWorkerConfig {
        channel_id: 0,
        streaming: streaming_config(),
        idle_timeout: Duration::from_secs(30),
        reconnect_backoff: Duration::from_millis(20),
        min_db_export_chars: 1,
        db_export_timeout: Duration::from_secs(3600),
    };

    let worker = AsrWorker::spawn(cfg, rx, transport.clone(), |_, _| {}, |_, _| {});

    // Fill well past the FIFO's capacity; bounded::send blocks rather than
    // drops, so every chunk sent here is guaranteed to eventually be seen.
    let total_chunks = 20;
    for i in 0..total_chunks {
        tx.send(PcmChunk {
            bytes: vec![i as u8; 4],
            channel_id: 0,
        })
        .expect("producer must never see a dropped send");
    }

    thread::sleep(Duration::from_millis(400));
    worker.shutdown();

    let sent = transport.sent_audio(0);
    assert_eq!(sent.len(), total_chunks, "every enqueued chunk must have reached the session, none dropped");
    for (i, chunk) in sent.iter().enumerate() {
        assert_eq!(chunk, &vec![i as u8; 4], "chunks must arrive in FIFO order, no reordering");
    }
}
