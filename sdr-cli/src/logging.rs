//! Structured event logging for pipeline lifecycle and export activity.
//!
//! This is distinct from the ambient `log`/`env_logger` facade that
//! `sdr-core`'s hot paths write to directly: `StructuredLogger` emits one
//! record per top-level pipeline event (startup, readiness waits, document
//! exports) in a chosen wire format, following the teacher's
//! JSON/logfmt/pretty `StructuredLogger`.

use crate::config::{LogFormat, LogTarget, LoggingConfig};
use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEvent {
    /// A document was posted (or dropped) to the retrieval store.
    DocumentExport(DocumentExportEvent),

    /// A readiness probe against an external dependency completed.
    ReadinessWait(ReadinessWaitEvent),

    Info { message: String },
    Warn { message: String },
    Error { message: String, details: Option<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentExportEvent {
    pub timestamp: DateTime<Utc>,
    pub stream_id: String,
    pub doc_index: u64,
    pub chars: usize,
    pub is_first: bool,
    pub is_last: bool,
    pub posted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessWaitEvent {
    pub timestamp: DateTime<Utc>,
    pub uri: String,
    pub ready: bool,
    pub waited_secs: f64,
}

pub struct StructuredLogger {
    config: LoggingConfig,
    writer: Box<dyn Write + Send>,
    start_time: DateTime<Utc>,
}

impl StructuredLogger {
    pub fn new(config: LoggingConfig) -> Result<Self> {
        let writer: Box<dyn Write + Send> = match &config.target {
            LogTarget::Stdout => Box::new(io::stdout()),
            LogTarget::Stderr => Box::new(io::stderr()),
            LogTarget::File => {
                let path = config
                    .file_path
                    .as_ref()
                    .ok_or_else(|| color_eyre::eyre::eyre!("file path required for file logging"))?;
                Box::new(BufWriter::new(File::create(path)?))
            }
        };

        Ok(Self {
            config,
            writer,
            start_time: Utc::now(),
        })
    }

    pub fn log(&mut self, event: LogEvent) -> Result<()> {
        let output = match self.config.format {
            LogFormat::Json => self.format_json(&event)?,
            LogFormat::Logfmt => self.format_logfmt(&event),
            LogFormat::Pretty => self.format_pretty(&event),
        };

        writeln!(self.writer, "{output}")?;
        self.writer.flush()?;
        Ok(())
    }

    fn format_json(&self, event: &LogEvent) -> Result<String> {
        Ok(serde_json::to_string(event)?)
    }

    fn format_logfmt(&self, event: &LogEvent) -> String {
        let ts = Utc::now().to_rfc3339();
        match event {
            LogEvent::DocumentExport(d) => format!(
                "ts=\"{ts}\" type=document_export stream_id={} doc_index={} chars={} is_first={} is_last={} posted={}",
                d.stream_id, d.doc_index, d.chars, d.is_first, d.is_last, d.posted
            ),
            LogEvent::ReadinessWait(r) => format!(
                "ts=\"{ts}\" type=readiness_wait uri={} ready={} waited_secs={:.2}",
                r.uri, r.ready, r.waited_secs
            ),
            LogEvent::Info { message } => format!("ts=\"{ts}\" level=info msg=\"{message}\""),
            LogEvent::Warn { message } => format!("ts=\"{ts}\" level=warn msg=\"{message}\""),
            LogEvent::Error { message, details } => match details {
                Some(d) => format!("ts=\"{ts}\" level=error msg=\"{message}\" details=\"{d}\""),
                None => format!("ts=\"{ts}\" level=error msg=\"{message}\""),
            },
        }
    }

    fn format_pretty(&self, event: &LogEvent) -> String {
        let ts = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
        match event {
            LogEvent::DocumentExport(d) => format!(
                "[{ts}] EXPORT: {} doc_index={} chars={} first={} last={} posted={}",
                d.stream_id, d.doc_index, d.chars, d.is_first, d.is_last, d.posted
            ),
            LogEvent::ReadinessWait(r) => format!(
                "[{ts}] READY: {} ready={} after {:.2}s",
                r.uri, r.ready, r.waited_secs
            ),
            LogEvent::Info { message } => format!("[{ts}] INFO: {message}"),
            LogEvent::Warn { message } => format!("[{ts}] WARN: {message}"),
            LogEvent::Error { message, details } => match details {
                Some(d) => format!("[{ts}] ERROR: {message} | {d}"),
                None => format!("[{ts}] ERROR: {message}"),
            },
        }
    }

    pub fn elapsed(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}
