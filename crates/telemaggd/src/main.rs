//! telemaggd — the telemagg daemon.
//!
//! Single binary that assembles the telemagg subsystems:
//! - Snapshot store (RCU)
//! - Ingestion worker (fetch → parse → publish, with retry)
//! - Ingestion metrics + readiness
//! - Read API
//!
//! and, for local development, a synthetic upstream that serves
//! switch counters as CSV.
//!
//! # Usage
//!
//! ```text
//! telemaggd generate --listen 127.0.0.1:9001
//! telemaggd serve --source-url http://127.0.0.1:9001/counters --listen 127.0.0.1:8080
//! ```

mod generator;
mod serve;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use telemagg_core::AggregatorConfig;

#[derive(Parser)]
#[command(name = "telemaggd", about = "telemagg metrics aggregation daemon")]
struct Cli {
    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run the ingestion worker and the read API.
    Serve(ServeArgs),

    /// Run a synthetic upstream serving switch counters as CSV.
    Generate(generator::GenerateArgs),
}

/// Flags override values from the config file.
#[derive(Args)]
struct ServeArgs {
    /// Path to a telemagg.toml config file.
    #[arg(long, env = "TELEMAGG_CONFIG")]
    config: Option<PathBuf>,

    /// Upstream URL returning delimited tabular text.
    #[arg(long, env = "TELEMAGG_SOURCE_URL")]
    source_url: Option<String>,

    /// Address for the read API.
    #[arg(long, env = "TELEMAGG_LISTEN")]
    listen: Option<String>,

    /// Seconds to sleep between ingestion cycles.
    #[arg(long, env = "TELEMAGG_POLL_INTERVAL")]
    poll_interval: Option<f64>,

    /// Seconds before a single fetch is abandoned.
    #[arg(long, env = "TELEMAGG_FETCH_TIMEOUT")]
    fetch_timeout: Option<f64>,

    /// Fetch attempts per cycle, including the first.
    #[arg(long, env = "TELEMAGG_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,

    /// Delay in seconds before the first retry; doubles per retry.
    #[arg(long, env = "TELEMAGG_BACKOFF_BASE")]
    backoff_base: Option<f64>,

    /// Run a single ingestion cycle, print the snapshot as JSON, and exit.
    #[arg(long)]
    once: bool,
}

impl ServeArgs {
    fn load_config(&self) -> anyhow::Result<AggregatorConfig> {
        let mut config = match &self.config {
            Some(path) => AggregatorConfig::from_file(path)?,
            None => AggregatorConfig::default(),
        };

        if let Some(v) = &self.source_url {
            config.source_url = v.clone();
        }
        if let Some(v) = &self.listen {
            config.listen = v.clone();
        }
        if let Some(v) = self.poll_interval {
            config.poll_interval_secs = v;
        }
        if let Some(v) = self.fetch_timeout {
            config.fetch_timeout_secs = v;
        }
        if let Some(v) = self.max_attempts {
            config.max_attempts = v;
        }
        if let Some(v) = self.backoff_base {
            config.backoff_base_secs = v;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Serve(args) => {
            let config = args.load_config()?;
            serve::run(config, args.once).await
        }
        Command::Generate(args) => generator::run(args).await,
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,telemagg=debug"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("telemaggd").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&[
            "serve",
            "--source-url",
            "http://upstream:9001/counters",
            "--poll-interval",
            "2.5",
            "--max-attempts",
            "5",
        ]);
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        let config = args.load_config().unwrap();
        assert_eq!(config.source_url, "http://upstream:9001/counters");
        assert_eq!(config.poll_interval_secs, 2.5);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.fetch_timeout_secs, telemagg_core::config::DEFAULT_FETCH_TIMEOUT_SECS);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let cli = parse(&["serve", "--max-attempts", "0"]);
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert!(args.load_config().is_err());
    }

    #[test]
    fn generate_defaults() {
        let cli = parse(&["generate"]);
        assert!(matches!(cli.command, Command::Generate(_)));
    }
}
