use boleto_ingest::application::scheduler::FlushScheduler;
use boleto_ingest::application::service::BoletoService;
use boleto_ingest::config::EngineConfig;
use boleto_ingest::error::IngestError;
use boleto_ingest::infrastructure::json_lines::JsonLinesPublisher;
use boleto_ingest::interfaces::csv::boleto_reader::BoletoReader;
use chrono::{Local, NaiveDate};
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Capacity used when neither the config file nor the command line sets one.
const DEFAULT_CAPACITY: usize = 1_000_000;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input boletos CSV file
    input: PathBuf,

    /// Engine configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Broker topic to publish to
    #[arg(long)]
    topic: Option<String>,

    /// Records per flush; reaching it in the buffer triggers an immediate flush
    #[arg(long)]
    max_batch_size: Option<usize>,

    /// Period of the scheduled flush, in milliseconds
    #[arg(long)]
    flush_interval_ms: Option<u64>,

    /// Maximum buffered boletos before new ones are rejected
    #[arg(long)]
    capacity: Option<usize>,

    /// Date due dates are validated against (defaults to the local date)
    #[arg(long)]
    today: Option<NaiveDate>,
}

impl Cli {
    /// Defaults, then the config file, then command-line overrides.
    fn engine_config(&self) -> Result<EngineConfig, IngestError> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_file(path)?,
            None => EngineConfig::default(),
        };
        if let Some(topic) = &self.topic {
            config.topic = topic.clone();
        }
        if let Some(max_batch_size) = self.max_batch_size {
            config.max_batch_size = max_batch_size;
        }
        if let Some(flush_interval_ms) = self.flush_interval_ms {
            config.flush_interval_ms = flush_interval_ms;
        }
        config.capacity = self.capacity.or(config.capacity).or(Some(DEFAULT_CAPACITY));
        config.validate()?;
        Ok(config)
    }
}

fn init_tracing() {
    // stdout carries the published messages, so logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(io::stderr().is_terminal()),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.engine_config().into_diagnostic()?;
    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());

    let publisher = Arc::new(JsonLinesPublisher::new(io::stdout()));
    let service = BoletoService::from_config(&config, publisher);

    let shutdown = CancellationToken::new();
    let scheduler = FlushScheduler::spawn(
        Arc::clone(service.dispatcher()),
        config.flush_interval(),
        shutdown.clone(),
    );

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = BoletoReader::new(file);
    let mut accepted = 0usize;
    let mut rejected = 0usize;
    for (index, request) in reader.requests().enumerate() {
        let row = index + 1;
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                rejected += 1;
                warn!(row, error = %e, "Error reading boleto");
                continue;
            }
        };
        match service.submit(request, today).await {
            Ok(()) => accepted += 1,
            Err(e) => {
                rejected += 1;
                warn!(row, retryable = e.is_retryable(), error = %e, "Error registering boleto");
            }
        }
    }

    // Stop the ticker and wait for the final flush
    shutdown.cancel();
    scheduler.await.into_diagnostic()?;

    let stats = service.dispatcher().stats();
    info!(
        accepted,
        rejected,
        dispatched = stats.records_dispatched,
        publish_failures = stats.publish_failures,
        "ingestion finished"
    );

    Ok(())
}
