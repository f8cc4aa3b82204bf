//! ELM327 query front end
//!
//! Opens an adapter transport and runs catalog commands against it.

pub mod config;

use crate::config::{Device, OutputFormat, QueryConfig};
use anyhow::Context;
use elm_protocol::{connect_tcp, open_serial, ElmError, ProtocolSession, Transport};
use obd_commands::CommandError;
use std::io::Write;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Initialize logging to stderr at `level`
pub fn init_logging(level: &str) -> anyhow::Result<()> {
    let level: Level = level
        .parse()
        .with_context(|| format!("invalid log level {:?}", level))?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")
}

/// Open the transport named by the configuration
pub async fn open_transport(config: &QueryConfig) -> anyhow::Result<Box<dyn Transport>> {
    let transport: Box<dyn Transport> = match config.device() {
        Device::Serial(path) => Box::new(
            open_serial(&path, config.baud_rate)
                .with_context(|| format!("failed to open serial adapter {}", path))?,
        ),
        Device::Tcp(addr) => Box::new(
            connect_tcp(&addr)
                .await
                .with_context(|| format!("failed to connect to adapter at {}", addr))?,
        ),
    };
    Ok(transport)
}

/// Run every configured command in order, writing one line per reading.
///
/// A failing command is logged and reported, and the remaining commands
/// still run. A timed-out command's late reply is discarded before the next
/// command is sent; if it never arrives, or the run is cancelled, the
/// commands not yet sent count as failures. Returns the number of failures.
pub async fn run_commands<T, W>(
    config: &QueryConfig,
    session: &ProtocolSession,
    transport: &mut T,
    out: &mut W,
) -> anyhow::Result<usize>
where
    T: Transport + ?Sized,
    W: Write,
{
    let mut failures = 0;

    for (index, spec) in config.commands.iter().enumerate() {
        let unsent = config.commands.len() - index - 1;

        let command = match obd_commands::catalog::resolve(spec) {
            Ok(command) => command,
            Err(e) => {
                error!("{}", e);
                failures += 1;
                continue;
            }
        };

        info!("Running {} ({})", command.name(), command.frame());
        let run = command.run(session, transport, config.imperial_units);
        let result = tokio::time::timeout(config.timeout(), run).await;
        let outcome = match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(CommandError::Elm(ElmError::Cancelled { .. }))) => {
                warn!("{} cancelled, skipping {} remaining commands", command.name(), unsent);
                failures += 1 + unsent;
                break;
            }
            Ok(Err(e)) => {
                error!("{} failed: {}", command.name(), e);
                failures += 1;
                continue;
            }
            Err(_) => {
                error!("{} timed out after {}ms", command.name(), config.timeout_ms);
                failures += 1;

                let drain = session.discard_pending(transport);
                if !matches!(tokio::time::timeout(config.timeout(), drain).await, Ok(Ok(_))) {
                    error!(
                        "Adapter did not return to its prompt, skipping {} remaining commands",
                        unsent
                    );
                    failures += unsent;
                    break;
                }
                continue;
            }
        };

        match config.output {
            OutputFormat::Text => writeln!(out, "{}: {}", command.name(), outcome.reading)?,
            OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&outcome)?)?,
        }
    }

    Ok(failures)
}
