mod config;
mod logging;

use clap::Parser;
use color_eyre::eyre::{eyre, Context, Result};
use config::CliConfig;
use logging::{DocumentExportEvent, LogEvent, ReadinessWaitEvent, StructuredLogger};
use parking_lot::Mutex;
use sdr_core::asr::{AsrWorker, AsrWorkerConfig, GrpcAsrTransport, StreamingConfig};
use sdr_core::channel_chain::{validate_channel_index, ChannelChain};
use sdr_core::dsp::{Channelizer, PacketFormatter, PcmPacker};
use sdr_core::export::{build_document, DocIndexCounter, FrontendClient, RetrievalClient};
use sdr_core::graph::GraphExecutor;
use sdr_core::ingest::BurstReader;
use sdr_core::lifecycle::{wait_for_uri, Pipeline};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "SDR channelization and transcription pipeline", long_about = None)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long)]
    config: String,

    /// Skip the startup readiness probes against ASR/frontend/database.
    #[arg(long)]
    skip_readiness: bool,
}

const READINESS_TIMEOUT: Duration = Duration::from_secs(300);
const READINESS_POLL: Duration = Duration::from_secs(5);
const ASR_RECONNECT_BACKOFF: Duration = Duration::from_secs(5);
const ASR_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    let cli_config = CliConfig::from_file(&args.config)
        .wrap_err_with(|| format!("failed to load config from {}", args.config))?;
    cli_config
        .pipeline
        .validate()
        .map_err(|e| eyre!("invalid pipeline configuration: {e}"))?;

    env_logger::Builder::new()
        .filter_level(match cli_config.logging.level {
            config::LogLevel::Debug => log::LevelFilter::Debug,
            config::LogLevel::Info => log::LevelFilter::Info,
            config::LogLevel::Warn => log::LevelFilter::Warn,
            config::LogLevel::Error => log::LevelFilter::Error,
        })
        .init();

    let logger = Arc::new(Mutex::new(StructuredLogger::new(cli_config.logging.clone())?));
    logger.lock().log(LogEvent::Info {
        message: "sdr-cli starting".to_string(),
    })?;

    if !args.skip_readiness {
        for uri in [
            &cli_config.endpoints.asr_uri,
            &cli_config.endpoints.frontend_uri,
            &cli_config.endpoints.database_uri,
        ] {
            let start = std::time::Instant::now();
            let result = wait_for_uri(uri, READINESS_TIMEOUT, READINESS_POLL);
            logger.lock().log(LogEvent::ReadinessWait(ReadinessWaitEvent {
                timestamp: chrono::Utc::now(),
                uri: uri.clone(),
                ready: result.is_ok(),
                waited_secs: start.elapsed().as_secs_f64(),
            }))?;
            result.map_err(|e| eyre!("readiness probe failed for {uri}: {e}"))?;
        }
    }

    let retrieval = Arc::new(RetrievalClient::new(format!(
        "http://{}",
        cli_config.endpoints.database_uri
    )));
    let frontend = Arc::new(FrontendClient::new(format!(
        "http://{}",
        cli_config.endpoints.frontend_uri
    )));
    retrieval
        .init(&cli_config.endpoints.rag_uuid)
        .map_err(|e| eyre!("retrieval store bootstrap failed: {e}"))?;

    let transport: Arc<dyn sdr_core::asr::AsrTransport> = Arc::new(
        GrpcAsrTransport::connect(&format!("http://{}", cli_config.endpoints.asr_uri))
            .map_err(|e| eyre!("failed to connect to ASR endpoint: {e}"))?,
    );

    let num_channels = cli_config.pipeline.channelizer.num_channels;
    let doc_index = DocIndexCounter::new();
    let mut chains = Vec::with_capacity(num_channels);
    let mut asr_workers = Vec::with_capacity(num_channels);

    for channel_id in 0..num_channels {
        validate_channel_index(channel_id, num_channels)
            .map_err(|e| eyre!("channel configuration error: {e}"))?;

        // Effectively-unbounded per spec: PcmPacker's `try_send` never
        // blocks, and queue-depth growth is purely observational (logged,
        // never dropped) until this capacity is genuinely exhausted.
        let (pcm_tx, pcm_rx) = crossbeam_channel::bounded(4096);
        let packer = PcmPacker::new(channel_id, pcm_tx);
        let chain = ChannelChain::new(
            channel_id,
            &cli_config.pipeline.lowpassfilt,
            &cli_config.pipeline.resample,
            cli_config.pipeline.sensor.sample_rate,
            packer,
        );
        chains.push(chain);

        let worker_cfg = AsrWorkerConfig {
            channel_id,
            streaming: StreamingConfig {
                src_lang_code: cli_config.pipeline.riva.src_lang_code.clone(),
                automatic_punctuation: cli_config.pipeline.riva.automatic_punctuation,
                verbatim_transcripts: cli_config.pipeline.riva.verbatim_transcripts,
                sample_rate_hz: cli_config.pipeline.riva.sample_rate,
            },
            idle_timeout: ASR_IDLE_TIMEOUT,
            reconnect_backoff: ASR_RECONNECT_BACKOFF,
            min_db_export_chars: cli_config.pipeline.riva.min_db_export_chars,
            db_export_timeout: Duration::from_secs_f64(cli_config.pipeline.riva.db_export_timeout_sec),
        };

        let frontend_partial = frontend.clone();
        let on_partial = move |channel_id: usize, text: String| {
            frontend_partial.post_partial(&text, channel_id, chrono::Utc::now());
        };

        let retrieval_flush = retrieval.clone();
        let doc_index_flush = doc_index.clone();
        let logger_flush = logger.clone();
        let on_flush = move |channel_id: usize, flush: sdr_core::asr::FlushEvent| {
            let chars = flush.text.len();
            let doc = build_document(flush, channel_id, &doc_index_flush, false);
            let stream_id = doc.stream_id.clone();
            let doc_index_val = doc.doc_index;
            let is_first = doc.is_first;
            retrieval_flush.add_doc(&doc);
            let _ = logger_flush.lock().log(LogEvent::DocumentExport(DocumentExportEvent {
                timestamp: chrono::Utc::now(),
                stream_id,
                doc_index: doc_index_val,
                chars,
                is_first,
                is_last: false,
                posted: true,
            }));
        };

        asr_workers.push(AsrWorker::spawn(
            worker_cfg,
            pcm_rx,
            transport.clone(),
            on_partial,
            on_flush,
        ));
    }

    let ingest = BurstReader::new(&cli_config.pipeline.network_rx);
    let formatter = PacketFormatter::new(
        cli_config.pipeline.sensor.sample_rate,
        cli_config.pipeline.pkt_format.log_period,
    );
    let channelizer = Channelizer::new(
        cli_config.pipeline.channelizer.num_channels,
        cli_config.pipeline.channelizer.channel_spacing,
    );

    let graph = GraphExecutor::spawn(ingest, formatter, channelizer, chains);
    let pipeline = Pipeline::new(graph, asr_workers);

    logger.lock().log(LogEvent::Info {
        message: format!("pipeline running with {num_channels} channels"),
    })?;

    let main_thread = std::thread::current();
    ctrlc::set_handler(move || main_thread.unpark())
        .wrap_err("failed to install Ctrl-C handler")?;
    std::thread::park();

    logger.lock().log(LogEvent::Info {
        message: "shutdown signal received, stopping pipeline".to_string(),
    })?;
    pipeline.shutdown();
    Ok(())
}
