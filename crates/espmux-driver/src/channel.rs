use std::io::Read;

use espmux_frame::{channel_name, ChannelId, Clock};
use espmux_transport::SerialPort;

use crate::link::{read_channel, EspLink};

/// A view of one channel of an [`EspLink`].
///
/// Implements [`Read`] with the link's receive timeout. Reads that time out
/// empty fail with `ErrorKind::TimedOut`.
pub struct Channel<'a, P, C> {
    link: &'a mut EspLink<P, C>,
    id: ChannelId,
}

impl<'a, P: SerialPort, C: Clock> Channel<'a, P, C> {
    pub(crate) fn new(link: &'a mut EspLink<P, C>, id: ChannelId) -> Self {
        Self { link, id }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        channel_name(self.id)
    }

    /// See [`EspLink::available_on`].
    pub fn available(&mut self) -> usize {
        self.link.available_on(self.id)
    }

    /// See [`EspLink::peek_on`].
    pub fn peek(&mut self) -> Option<u8> {
        self.link.peek_on(self.id)
    }

    /// See [`EspLink::recv_on`].
    pub fn recv(&mut self, out: &mut [u8], timeout_ms: u32) -> usize {
        self.link.recv_on(self.id, out, timeout_ms)
    }
}

impl<P: SerialPort, C: Clock> Read for Channel<'_, P, C> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        read_channel(self.link, self.id, buf)
    }
}

impl<P, C> std::fmt::Debug for Channel<'_, P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;

    use espmux_frame::StepClock;
    use espmux_transport::MemoryPort;

    use super::*;
    use crate::config::DriverConfig;

    fn link(wire: &[u8]) -> EspLink<MemoryPort, StepClock> {
        EspLink::with_clock(
            MemoryPort::from_bytes(wire),
            StepClock::new(),
            DriverConfig::default(),
        )
    }

    #[test]
    fn channels_read_independently() {
        let mut link = link(b"+IPD,0,3:one+IPD,1,3:two");

        let mut buf = [0u8; 3];
        {
            let mut ch1 = link.channel(1).unwrap();
            assert_eq!(ch1.name(), "MUX1");
            // First pass stores channel 0's packet, second finds channel 1's.
            assert_eq!(ch1.available(), 0);
            assert_eq!(ch1.available(), 3);
            ch1.read_exact(&mut buf).unwrap();
            assert_eq!(&buf, b"two");
        }

        let mut ch0 = link.channel(0).unwrap();
        assert_eq!(ch0.id(), 0);
        assert_eq!(ch0.peek(), Some(b'o'));
        assert_eq!(ch0.recv(&mut buf, 100), 3);
        assert_eq!(&buf, b"one");
    }

    #[test]
    fn read_times_out_when_idle() {
        let mut link = link(b"");
        let mut ch = link.channel(2).unwrap();
        let err = ch.read(&mut [0u8; 4]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TimedOut);
    }

    #[test]
    fn read_to_end_style_loop_over_multiple_packets() {
        let mut link = link(b"+IPD,4,2:ab\r\n+IPD,4,2:cd");
        let mut ch = link.channel(4).unwrap();

        let mut collected = Vec::new();
        let mut buf = [0u8; 8];
        while let Ok(n) = ch.read(&mut buf) {
            collected.extend_from_slice(&buf[..n]);
        }
        assert_eq!(collected, b"abcd");
    }
}
