use std::io::{ErrorKind, Read};
use std::path::PathBuf;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use serialport::SerialPort as _;
use tracing::{debug, warn};

use crate::error::{Result, TransportError};
use crate::traits::SerialPort;

/// Read timeout handed to the driver. Reads only happen once the driver
/// reports bytes waiting, so this is a backstop, not a poll interval.
const READ_TIMEOUT: Duration = Duration::from_millis(10);
const READ_CHUNK_SIZE: usize = 256;

/// A UART opened through the `serialport` crate.
///
/// `available` asks the driver how many bytes are queued and pulls them
/// into a local buffer; reads never wait on an idle line. A read timeout is
/// treated as "nothing yet". Any other error idles the port and is kept for
/// [`take_error`](DevicePort::take_error).
pub struct DevicePort {
    inner: Box<dyn serialport::SerialPort>,
    buf: BytesMut,
    error: Option<std::io::Error>,
}

impl DevicePort {
    /// Open `path` (`/dev/ttyUSB0`, `COM3`, ...) at `baud_rate`, 8N1, no
    /// flow control.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let inner = serialport::new(path, baud_rate)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|err| TransportError::Open {
                path: PathBuf::from(path),
                source: err.into(),
            })?;
        debug!(path, baud_rate, "opened serial device");
        Ok(Self::new(inner))
    }

    /// Wrap an already configured port.
    pub fn new(inner: Box<dyn serialport::SerialPort>) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
            error: None,
        }
    }

    /// Device name as reported by the driver.
    pub fn name(&self) -> Option<String> {
        self.inner.name()
    }

    /// True once the device failed; buffered bytes can still be read.
    pub fn is_closed(&self) -> bool {
        self.error.is_some()
    }

    /// Take the error that idled the port, if any.
    pub fn take_error(&mut self) -> Option<TransportError> {
        self.error.take().map(TransportError::Io)
    }

    fn poll_inner(&mut self) {
        if self.is_closed() {
            return;
        }

        let queued = match self.inner.bytes_to_read() {
            Ok(queued) => queued as usize,
            Err(err) => {
                warn!(error = %err, "serial device query failed");
                self.error = Some(err.into());
                return;
            }
        };
        if queued == 0 {
            return;
        }

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let want = queued.min(READ_CHUNK_SIZE);
        match self.inner.read(&mut chunk[..want]) {
            Ok(n) => self.buf.extend_from_slice(&chunk[..n]),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) => {}
            Err(err) => {
                warn!(error = %err, "serial device read failed");
                self.error = Some(err);
            }
        }
    }
}

impl SerialPort for DevicePort {
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

impl std::fmt::Debug for DevicePort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevicePort")
            .field("name", &self.inner.name())
            .field("buffered", &self.buf.len())
            .field("error", &self.error)
            .finish()
    }
}
