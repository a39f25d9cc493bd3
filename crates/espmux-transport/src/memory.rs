use std::collections::VecDeque;

use crate::traits::SerialPort;

/// In-memory serial port.
///
/// Bytes handed to [`feed`](MemoryPort::feed) become available immediately,
/// in order. Useful for replaying captures and for exercising the engine
/// without hardware.
#[derive(Debug, Default, Clone)]
pub struct MemoryPort {
    rx: VecDeque<u8>,
    consumed: usize,
}

impl MemoryPort {
    /// Create an empty port.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a port with `bytes` already waiting.
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Self {
        let mut port = Self::new();
        port.feed(bytes);
        port
    }

    /// Append bytes to the receive queue.
    pub fn feed(&mut self, bytes: impl AsRef<[u8]>) {
        self.rx.extend(bytes.as_ref());
    }

    /// Bytes still waiting to be read, oldest first.
    pub fn pending(&self) -> Vec<u8> {
        self.rx.iter().copied().collect()
    }

    /// Total bytes read from this port so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Drop everything still waiting.
    pub fn clear(&mut self) {
        self.rx.clear();
    }
}

impl SerialPort for MemoryPort {
    fn available(&mut self) -> usize {
        self.rx.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        let byte = self.rx.pop_front()?;
        self.consumed += 1;
        Some(byte)
    }

    fn peek_byte(&mut self) -> Option<u8> {
        self.rx.front().copied()
    }
}
