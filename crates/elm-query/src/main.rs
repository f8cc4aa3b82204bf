//! ELM327 Query Tool - Main Entry Point

use clap::Parser;
use elm_query::config::{OutputFormat, QueryConfig};
use elm_query::{init_logging, open_transport, run_commands};
use elm_protocol::{CancelFlag, ProtocolSession};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

/// Query an OBD-II vehicle through an ELM327 adapter
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Config file (TOML, YAML or JSON)
    #[arg(short, long, env = "ELM_QUERY_CONFIG")]
    config: Option<PathBuf>,

    /// Serial device path or tcp://host:port
    #[arg(short, long)]
    device: Option<String>,

    /// Serial baud rate
    #[arg(short, long)]
    baud_rate: Option<u32>,

    /// Delay between sending a command and reading the reply (ms)
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Per-command timeout (ms)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Report readings in imperial units
    #[arg(long)]
    imperial: bool,

    /// Print one JSON object per reading
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// List catalog commands and exit
    #[arg(long)]
    list: bool,

    /// Catalog names or raw:<command> to run, in order
    commands: Vec<String>,
}

impl Args {
    fn apply(self, config: &mut QueryConfig) {
        if let Some(device) = self.device {
            config.device = device;
        }
        if let Some(baud_rate) = self.baud_rate {
            config.baud_rate = baud_rate;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.response_delay_ms = delay_ms;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level;
        }
        if self.imperial {
            config.imperial_units = true;
        }
        if self.json {
            config.output = OutputFormat::Json;
        }
        if !self.commands.is_empty() {
            config.commands = self.commands;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    if args.list {
        for name in obd_commands::catalog::names() {
            println!("{}", name);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = QueryConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    init_logging(&config.log_level)?;

    info!("=== ELM327 Query v{} ===", env!("CARGO_PKG_VERSION"));

    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling exchange in progress");
            on_interrupt.cancel();
        }
    });

    let session = ProtocolSession::new()
        .with_response_delay(config.response_delay())
        .with_cancel_flag(cancel);

    let mut transport = open_transport(&config).await?;
    let failures = run_commands(
        &config,
        &session,
        transport.as_mut(),
        &mut std::io::stdout().lock(),
    )
    .await?;

    if failures > 0 {
        warn!("{} of {} commands failed", failures, config.commands.len());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
