//! Byte-stream transports
//!
//! The engine talks to anything that is `AsyncRead + AsyncWrite`. Opening,
//! closing and pooling the stream is the caller's business; the helpers here
//! only cover the common ways of obtaining one.

use crate::error::ElmResult;
use crate::session::CancelFlag;
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::info;

/// A duplex byte stream to an adapter
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + ?Sized> Transport for T {}

/// Open a serial adapter (e.g. "/dev/ttyUSB0" or "COM3")
pub fn open_serial(device: &str, baud_rate: u32) -> ElmResult<SerialStream> {
    info!("Opening serial adapter {} at {} baud", device, baud_rate);
    let stream = tokio_serial::new(device, baud_rate)
        .open_native_async()
        .map_err(io::Error::from)?;
    Ok(stream)
}

/// Connect to a Wi-Fi adapter listening on `addr` (e.g. "192.168.0.10:35000")
pub async fn connect_tcp(addr: &str) -> ElmResult<TcpStream> {
    info!("Connecting to adapter at {}", addr);
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

/// Scripted transport for tests and demos (no hardware required).
///
/// Reads are served from a queue of canned adapter output; writes are
/// recorded for assertions. Once the queue is drained reads report
/// end-of-stream, or the configured error.
#[derive(Debug, Default)]
pub struct MockTransport {
    /// Bytes returned by reads (FIFO order)
    incoming: VecDeque<u8>,
    /// Everything written so far
    written: Vec<u8>,
    /// Error returned once `incoming` is exhausted
    read_error: Option<io::ErrorKind>,
    /// Flag raised after the given number of bytes has been read
    cancel_after: Option<(usize, CancelFlag)>,
    /// Bytes served so far
    served: usize,
}

impl MockTransport {
    /// Create a mock with no queued output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock pre-loaded with adapter output.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut mock = Self::new();
        for response in responses {
            mock.queue_response(response);
        }
        mock
    }

    /// Queue more adapter output.
    pub fn queue_response(&mut self, response: impl AsRef<[u8]>) {
        self.incoming.extend(response.as_ref());
    }

    /// Fail reads with `kind` once the queued output is drained.
    pub fn fail_reads_with(mut self, kind: io::ErrorKind) -> Self {
        self.read_error = Some(kind);
        self
    }

    /// Raise `flag` once `bytes` bytes have been read.
    pub fn cancel_after(mut self, bytes: usize, flag: CancelFlag) -> Self {
        self.cancel_after = Some((bytes, flag));
        self
    }

    /// All bytes written so far
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Written bytes as text
    pub fn written_text(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }

    /// Output still queued
    pub fn remaining(&self) -> usize {
        self.incoming.len()
    }
}

impl AsyncRead for MockTransport {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if this.incoming.is_empty() {
            if let Some(kind) = this.read_error {
                return Poll::Ready(Err(io::Error::new(kind, "mock transport failure")));
            }
            return Poll::Ready(Ok(()));
        }

        let n = buf.remaining().min(this.incoming.len());
        let chunk: Vec<u8> = this.incoming.drain(..n).collect();
        buf.put_slice(&chunk);
        this.served += n;

        if let Some((limit, flag)) = &this.cancel_after {
            if this.served >= *limit {
                flag.cancel();
            }
        }

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockTransport {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.get_mut().written.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
