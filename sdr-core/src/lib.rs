//! Core channelization, DSP, and ASR fan-out pipeline for the SDR
//! transcription system.
//!
//! Stages: UDP/TCP burst ingest -> packet formatting -> channelization ->
//! per-channel filter/demod/resample/pack -> streaming ASR -> transcript
//! segmentation -> document export, wired together by a static fan-out
//! graph and driven by `sdr-cli`.

pub mod asr;
pub mod channel_chain;
pub mod clock;
pub mod config;
pub mod dsp;
pub mod errors;
pub mod export;
pub mod graph;
pub mod ingest;
pub mod lifecycle;

pub use config::AppConfig;
pub use errors::{Result, SdrError};
pub use lifecycle::Pipeline;
