//! A request frame paired with the formula that reads its reply

use crate::error::CommandResult;
use crate::reading::{PayloadDecoder, Reading};
use elm_protocol::{CommandFrame, Exchange, ProtocolSession, Transport};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Reading plus the exchange it was decoded from
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutcome {
    pub reading: Reading,
    pub exchange: Exchange,
}

/// One runnable OBD-II command
pub struct ObdCommand {
    name: &'static str,
    frame: CommandFrame,
    decoder: Box<dyn PayloadDecoder>,
}

impl ObdCommand {
    pub fn new(name: &'static str, frame: CommandFrame, decoder: impl PayloadDecoder + 'static) -> Self {
        Self {
            name,
            frame,
            decoder: Box::new(decoder),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn frame(&self) -> &CommandFrame {
        &self.frame
    }

    /// Apply this command's formula to an exchange result
    pub fn decode(&self, exchange: &Exchange, imperial: bool) -> CommandResult<Reading> {
        let mut reading = self.decoder.decode_payload(&exchange.payload, imperial)?;
        reading.name = self.name;
        Ok(reading)
    }

    /// Execute the command on `transport` and decode the reply
    pub async fn run<T>(
        &self,
        session: &ProtocolSession,
        transport: &mut T,
        imperial: bool,
    ) -> CommandResult<CommandOutcome>
    where
        T: Transport + ?Sized,
    {
        let exchange = session.execute(&self.frame, transport).await?;
        let reading = self.decode(&exchange, imperial)?;
        debug!("{} -> {}", self.name, reading);
        Ok(CommandOutcome { reading, exchange })
    }

    /// Ask the adapter to repeat its last reply and decode it
    pub async fn rerun<T>(
        &self,
        session: &ProtocolSession,
        transport: &mut T,
        imperial: bool,
    ) -> CommandResult<CommandOutcome>
    where
        T: Transport + ?Sized,
    {
        let exchange = session.resend(&self.frame, transport).await?;
        let reading = self.decode(&exchange, imperial)?;
        Ok(CommandOutcome { reading, exchange })
    }
}

impl fmt::Debug for ObdCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObdCommand")
            .field("name", &self.name)
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}
