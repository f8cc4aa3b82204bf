//! Request/Response Exchanges with ELM327 Adapters
//!
//! One exchange is strictly sequential: write the command, optionally wait
//! for the adapter to settle, read until the `>` prompt, then classify,
//! normalize and decode. The session holds configuration only; every
//! exchange returns its own [`Exchange`] value.

use crate::classifier;
use crate::command::CommandFrame;
use crate::error::{ElmError, ElmResult};
use crate::hex;
use crate::normalizer;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Command terminator
const CARRIAGE_RETURN: u8 = b'\r';

/// Prompt the adapter prints when it is ready for the next command
const PROMPT: u8 = b'>';

/// Shared flag used to abort an exchange between byte reads
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the exchange in progress
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Re-arm the flag for the next exchange
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Timing captured for one exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeTiming {
    /// When the command was written (Unix ms)
    pub start_ms: u64,
    /// When the response was complete (Unix ms, never before `start_ms`)
    pub end_ms: u64,
    /// Settling delay applied between write and read
    pub response_delay: Duration,
    /// Monotonic duration of the whole exchange
    pub elapsed: Duration,
}

/// Result of one successful exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    /// Command text the response belongs to
    pub command: String,
    /// Decoded payload bytes, in transmission order
    pub payload: Vec<u8>,
    /// Normalized hex text the payload was decoded from
    pub normalized: String,
    /// Timing of the exchange
    pub timing: ExchangeTiming,
}

fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Executes command frames against an adapter
#[derive(Debug, Clone, Default)]
pub struct ProtocolSession {
    /// Wait between writing a command and reading its response
    response_delay: Duration,
    /// Checked between byte reads
    cancel: Option<CancelFlag>,
}

impl ProtocolSession {
    /// Create a session with no settling delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait `delay` after each write before reading the response
    pub fn with_response_delay(mut self, delay: Duration) -> Self {
        self.response_delay = delay;
        self
    }

    /// Abort reads when `flag` is raised
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Configured settling delay
    pub fn response_delay(&self) -> Duration {
        self.response_delay
    }

    /// Send `frame` and decode the adapter's reply.
    ///
    /// Adapter-reported errors, non-hex responses, cancellation and transport
    /// failures all abort the exchange without a payload.
    pub async fn execute<T>(&self, frame: &CommandFrame, transport: &mut T) -> ElmResult<Exchange>
    where
        T: AsyncRead + AsyncWrite + Unpin + ?Sized,
    {
        let mut request = Vec::with_capacity(frame.wire_text().len() + 1);
        request.extend_from_slice(frame.wire_text().as_bytes());
        request.push(CARRIAGE_RETURN);
        self.exchange(frame, &request, transport).await
    }

    /// Ask the adapter to repeat its last response.
    ///
    /// Only the carriage return is written; `frame` names the command the
    /// repeated response belongs to.
    pub async fn resend<T>(&self, frame: &CommandFrame, transport: &mut T) -> ElmResult<Exchange>
    where
        T: AsyncRead + AsyncWrite + Unpin + ?Sized,
    {
        self.exchange(frame, &[CARRIAGE_RETURN], transport).await
    }

    async fn exchange<T>(
        &self,
        frame: &CommandFrame,
        request: &[u8],
        transport: &mut T,
    ) -> ElmResult<Exchange>
    where
        T: AsyncRead + AsyncWrite + Unpin + ?Sized,
    {
        let command = frame.wire_text();
        self.check_cancelled(command, 0)?;

        let started = Instant::now();
        let start_ms = unix_ms();

        debug!("Sending {:?}", String::from_utf8_lossy(request));
        transport.write_all(request).await?;
        transport.flush().await?;

        if !self.response_delay.is_zero() {
            debug!("Waiting {:?} before reading", self.response_delay);
            tokio::time::sleep(self.response_delay).await;
        }

        let raw = self.read_raw(command, transport).await?;
        debug!("Raw response to {:?}: {:?}", command, raw);

        classifier::classify(&raw, command)?;

        let normalized = normalizer::normalize(&raw);
        let payload = hex::decode(&normalized)?;

        let end_ms = unix_ms().max(start_ms);
        Ok(Exchange {
            command: command.to_string(),
            payload,
            normalized,
            timing: ExchangeTiming {
                start_ms,
                end_ms,
                response_delay: self.response_delay,
                elapsed: started.elapsed(),
            },
        })
    }

    /// Discard adapter output up to and including the next prompt.
    ///
    /// Used to resynchronize after an exchange was abandoned before its
    /// response was read, so the next command does not receive it. Returns
    /// the discarded text.
    pub async fn discard_pending<T>(&self, transport: &mut T) -> ElmResult<String>
    where
        T: AsyncRead + Unpin + ?Sized,
    {
        let discarded = self.read_raw("<pending>", transport).await?;
        if !discarded.is_empty() {
            info!("Discarded stale adapter output {:?}", discarded);
        }
        Ok(discarded)
    }

    fn check_cancelled(&self, command: &str, received: usize) -> ElmResult<()> {
        if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
            info!("Exchange for {:?} cancelled after {} bytes", command, received);
            return Err(ElmError::Cancelled {
                command: command.to_string(),
            });
        }
        Ok(())
    }

    /// Read until the prompt or end-of-stream, whichever comes first
    async fn read_raw<T>(&self, command: &str, transport: &mut T) -> ElmResult<String>
    where
        T: AsyncRead + Unpin + ?Sized,
    {
        let mut raw = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            self.check_cancelled(command, raw.len())?;

            if transport.read(&mut byte).await? == 0 {
                debug!("End of stream while reading response to {:?}", command);
                break;
            }
            if byte[0] == PROMPT {
                break;
            }
            raw.push(byte[0]);
        }

        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}
