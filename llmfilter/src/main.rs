//! llmfilter host: reads newline-delimited JSON records on stdin, enriches
//! them and writes them to stdout. Logs go to stderr.

use anyhow::{anyhow, Context};
use clap::Parser;
use llmfilter::host;
use tokio::io::{self, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "llmfilter", version, about = "Enrich JSON log records with generated text")]
struct Cli {
    /// Filter setting as key=value (repeatable), e.g. -p prompt="Tell me the main topic."
    #[arg(short = 'p', long = "property", value_name = "KEY=VALUE")]
    properties: Vec<String>,

    /// Records processed concurrently; output order is preserved
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let settings = host::parse_properties(&cli.properties).map_err(|e| anyhow!(e))?;
    let filter = llmfilter::connect(settings)
        .await
        .context("failed to initialize llm filter")?;

    host::run(
        &filter,
        BufReader::new(io::stdin()),
        io::stdout(),
        cli.concurrency,
    )
    .await
    .context("i/o error while filtering")?;

    Ok(())
}
