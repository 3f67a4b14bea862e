//! ASR fan-out: one streaming session per channel, a segmenter that turns
//! the transcript stream into document windows, and the worker thread that
//! ties a channel's PCM FIFO to both (spec §4.5).

pub mod mock;
pub mod riva;
pub mod segmenter;
pub mod transport;
pub mod worker;

pub use mock::MockAsrTransport;
pub use riva::GrpcAsrTransport;
pub use segmenter::{FlushEvent, Segmenter, SegmenterOutput};
pub use transport::{AsrSession, AsrTransport, StreamingConfig, TranscriptEvent};
pub use worker::AsrWorker;
