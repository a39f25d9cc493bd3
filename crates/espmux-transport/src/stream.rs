use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::traits::SerialPort;

const INITIAL_BUFFER_CAPACITY: usize = 1024;
const READ_CHUNK_SIZE: usize = 256;

/// Serial port backed by any `Read` stream.
///
/// Each poll issues at most one `read` on the inner stream. `WouldBlock` and
/// `TimedOut` mean "nothing yet"; end of stream leaves the port idle with
/// whatever was already buffered. Any other I/O error also idles the port and
/// is kept for [`take_error`](StreamPort::take_error).
pub struct StreamPort<T> {
    inner: T,
    buf: BytesMut,
    eof: bool,
    error: Option<std::io::Error>,
}

impl<T: Read> StreamPort<T> {
    /// Wrap a reader. A blocking reader stalls every poll until it has data;
    /// serial devices go through [`DevicePort`](crate::DevicePort) instead.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            eof: false,
            error: None,
        }
    }

    /// True once the inner stream reported end of stream or failed.
    pub fn is_closed(&self) -> bool {
        self.eof || self.error.is_some()
    }

    /// Take the I/O error that idled the port, if any.
    pub fn take_error(&mut self) -> Option<TransportError> {
        self.error.take().map(TransportError::Io)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the port and return the inner stream. Buffered bytes are lost.
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn poll_inner(&mut self) {
        if self.is_closed() {
            return;
        }

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => {
                    debug!(buffered = self.buf.len(), "serial stream reached end");
                    self.eof = true;
                }
                Ok(n) => self.buf.extend_from_slice(&chunk[..n]),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                Err(err) => {
                    warn!(error = %err, "serial stream read failed");
                    self.error = Some(err);
                }
            }
            return;
        }
    }
}

impl<T: Read> SerialPort for StreamPort<T> {
    fn available(&mut self) -> usize {
        self.poll_inner();
        self.buf.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.buf.is_empty() {
            self.poll_inner();
        }
        if self.buf.is_empty() {
            return None;
        }
        Some(self.buf.get_u8())
    }

    fn peek_byte(&mut self) -> Option<u8> {
        if self.buf.is_empty() {
            self.poll_inner();
        }
        self.buf.first().copied()
    }
}

impl<T> std::fmt::Debug for StreamPort<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamPort")
            .field("buffered", &self.buf.len())
            .field("eof", &self.eof)
            .field("error", &self.error)
            .finish()
    }
}
