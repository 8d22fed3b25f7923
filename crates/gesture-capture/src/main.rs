//! gesture-capture entry point.
//!
//! Runs the capture pipeline headless: a JSON-lines script plays the part of
//! the UI toolkit and the sensor service, and drained samples go to the
//! configured sink.
//!
//! ```text
//! main()
//!  └─ load CaptureConfig (file → CLI/env overrides)
//!  └─ CapturePipeline::new(SessionContext, sink)
//!       └─ start()            -- spawns the drain task
//!  └─ ReplayDriver::run()     -- taps + navigation hook fed from the script
//!  └─ shutdown()              -- stop, wait for the in-flight write
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gesture_capture::application::sink::Sink;
use gesture_capture::infrastructure::replay::{ReplayDriver, ReplaySummary};
use gesture_capture::infrastructure::sensors::HeadlessSensorRegistrar;
use gesture_capture::infrastructure::sinks::{CsvFileSink, LogSink};
use gesture_capture::infrastructure::storage::config::{
    load_config, load_config_from, CaptureConfig, ConfigError, SinkKind,
};
use gesture_capture::{CapturePipeline, PipelineOptions};
use gesture_core::SessionContext;

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SinkArg {
    Log,
    Csv,
}

impl From<SinkArg> for SinkKind {
    fn from(arg: SinkArg) -> Self {
        match arg {
            SinkArg::Log => SinkKind::Log,
            SinkArg::Csv => SinkKind::Csv,
        }
    }
}

/// Behavioural-biometrics capture pipeline, driven by a replay script.
#[derive(Debug, Parser)]
#[command(name = "gesture-capture", version)]
struct Cli {
    /// JSON-lines driver script.  `-` reads from stdin.
    #[arg(long, default_value = "-", env = "GESTURE_SCRIPT")]
    script: String,

    /// Config file.  Defaults to the platform config directory.
    #[arg(long, env = "GESTURE_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides `[sink] kind`.
    #[arg(long, value_enum, env = "GESTURE_SINK")]
    sink: Option<SinkArg>,

    /// Overrides `[sink] path` (CSV output).
    #[arg(long, env = "GESTURE_OUTPUT")]
    output: Option<PathBuf>,

    /// Overrides `[dispatcher] capacity`.
    #[arg(long, env = "GESTURE_CAPACITY")]
    capacity: Option<usize>,

    /// Skip samples while no session is open.
    #[arg(long, env = "GESTURE_STRICT_SESSION")]
    strict_session: bool,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<CaptureConfig> {
        let mut config = match &self.config {
            Some(path) => load_config_from(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => match load_config() {
                Err(ConfigError::NoPlatformConfigDir) => CaptureConfig::default(),
                other => other.context("loading config from the platform config directory")?,
            },
        };

        if let Some(sink) = self.sink {
            config.sink.kind = sink.into();
        }
        if let Some(output) = &self.output {
            config.sink.path = output.clone();
        }
        if let Some(capacity) = self.capacity {
            config.dispatcher.capacity = capacity;
        }
        if self.strict_session {
            config.capture.strict_session = true;
        }
        Ok(config)
    }
}

async fn open_script(script: &str) -> anyhow::Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    if script == "-" {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    let file = tokio::fs::File::open(script)
        .await
        .with_context(|| format!("opening replay script {script}"))?;
    Ok(Box::new(BufReader::new(file)))
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.capture.log_level)),
        )
        .init();

    info!(
        sink = ?config.sink.kind,
        capacity = config.dispatcher.capacity,
        "gesture-capture starting"
    );

    let mut csv_sink = None;
    let sink: Arc<dyn Sink> = match config.sink.kind {
        SinkKind::Log => Arc::new(LogSink::new()),
        SinkKind::Csv => {
            let csv = Arc::new(
                CsvFileSink::open(&config.sink.path)
                    .await
                    .with_context(|| format!("opening CSV sink {}", config.sink.path.display()))?,
            );
            csv_sink = Some(Arc::clone(&csv));
            csv
        }
    };

    let session = Arc::new(SessionContext::new());
    let pipeline = CapturePipeline::new(session, sink, PipelineOptions::from(&config));
    pipeline.start().context("starting the dispatcher")?;

    let driver = ReplayDriver::new(&pipeline, Arc::new(HeadlessSensorRegistrar::new()));
    let reader = open_script(&cli.script).await?;

    let summary = tokio::select! {
        result = driver.run(reader) => result.context("replaying driver script")?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            ReplaySummary::default()
        }
    };

    // Let the drain task catch up before stopping it.
    while pipeline.stats().buffered > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    driver.sensor_tap().deactivate();
    pipeline.shutdown().await;

    if let Some(csv) = csv_sink {
        if let Err(e) = csv.close().await {
            warn!(error = %e, "closing CSV sink failed");
        }
    }

    let stats = pipeline.stats();
    info!(
        applied = summary.applied,
        rejected = summary.rejected,
        enqueued = stats.enqueued,
        delivered = stats.delivered,
        dropped = stats.dropped,
        sink_failures = stats.sink_failures,
        "gesture-capture stopped"
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
