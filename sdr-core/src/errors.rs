//! Error taxonomy for the SDR pipeline, layered by subsystem.

use thiserror::Error;

/// Top-level error type for all pipeline operations.
#[derive(Debug, Error)]
pub enum SdrError {
    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("channelizer error: {0}")]
    Channelizer(#[from] ChannelizerError),

    #[error("dsp error: {0}")]
    Dsp(#[from] DspError),

    #[error("asr error: {0}")]
    Asr(#[from] AsrError),

    #[error("export error: {0}")]
    Export(#[from] ExportError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),
}

/// Network ingest errors (UDP/TCP socket layer).
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to bind socket on {addr}: {reason}")]
    BindFailed { addr: String, reason: String },

    #[error("failed to configure socket: {reason}")]
    SocketConfig { reason: String },

    #[error("read error on burst socket: {reason}")]
    ReadFailed { reason: String },

    #[error("unsupported L4 transport: {proto}")]
    UnsupportedTransport { proto: String },
}

/// Channelizer errors.
#[derive(Debug, Error)]
pub enum ChannelizerError {
    #[error("channel index {index} out of range for {num_channels} channels")]
    ChannelOutOfRange { index: usize, num_channels: usize },

    #[error("bandwidth guard violated: (N-1)*spacing + channel_bw = {used_hz} Hz exceeds Nyquist {nyquist_hz} Hz")]
    BandwidthGuardViolated { used_hz: f64, nyquist_hz: f64 },
}

/// Per-channel DSP chain errors (filter, demod, resample, pcm).
#[derive(Debug, Error)]
pub enum DspError {
    #[error("filter design failed: {reason}")]
    FilterDesignFailed { reason: String },

    #[error("FM demod requires complex input, got {len}-sample real buffer")]
    NonComplexInput { len: usize },

    #[error("empty input to {stage}")]
    EmptyInput { stage: String },

    #[error("invalid resample rate: up={up} exceeds max_up={max_up}, or up*fs_small={product} exceeds 10 MHz")]
    InvalidResampleRate { up: u32, max_up: u32, product: f64 },
}

/// ASR streaming session errors.
#[derive(Debug, Error)]
pub enum AsrError {
    #[error("transport connect failed: {reason}")]
    ConnectFailed { reason: String },

    #[error("stream send failed: {reason}")]
    SendFailed { reason: String },

    #[error("stream recv failed: {reason}")]
    RecvFailed { reason: String },

    #[error("session closed by remote")]
    SessionClosed,

    #[error("fifo starved for {secs}s, ending session")]
    FifoStarved { secs: u64 },
}

/// Document export errors (retrieval store, frontend).
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("retrieval service init failed after {attempts} attempts: {reason}")]
    InitFailed { attempts: u32, reason: String },

    #[error("add_doc post failed: {reason}")]
    AddDocFailed { reason: String },

    #[error("frontend post failed: {reason}")]
    FrontendFailed { reason: String },
}

/// Configuration validation errors, fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid sample rate: {rate} Hz (must be > 0)")]
    InvalidSampleRate { rate: f64 },

    #[error("invalid URI: {uri}")]
    InvalidUri { uri: String },

    #[error("bandwidth guard violated at config load: (N-1)*{spacing_hz} + {channel_bw_hz} = {used_hz} Hz exceeds fs_in/2 = {nyquist_hz} Hz")]
    BandwidthGuardViolated {
        spacing_hz: f64,
        channel_bw_hz: f64,
        used_hz: f64,
        nyquist_hz: f64,
    },

    #[error("invalid resampler configuration: {reason}")]
    InvalidResampler { reason: String },
}

/// Startup readiness-probe errors.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("invalid readiness-probe URI: {uri}")]
    InvalidUri { uri: String },

    #[error("timed out after {timeout_secs}s waiting for {uri} to accept connections")]
    ReadinessTimeout { uri: String, timeout_secs: u64 },
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, SdrError>;
