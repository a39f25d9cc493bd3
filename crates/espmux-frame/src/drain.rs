use espmux_transport::SerialPort;
use tracing::{debug, warn};

use crate::channel::{channel_name, ChannelId};
use crate::deadline::{Clock, Deadline};
use crate::header::Header;
use crate::pool::ChannelPool;

/// Outcome of copying one packet's payload into its channel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketReport {
    pub channel: ChannelId,
    /// Length announced by the header.
    pub declared: u32,
    /// Payload bytes taken off the port.
    pub consumed: u32,
    /// Consumed bytes lost because the channel buffer was full.
    pub dropped: u32,
    /// Noise read off the port ahead of the header.
    pub skipped: usize,
}

impl PacketReport {
    fn new(header: Header) -> Self {
        Self {
            channel: header.channel,
            declared: header.len,
            consumed: 0,
            dropped: 0,
            skipped: 0,
        }
    }

    /// Bytes that actually landed in the channel buffer.
    pub fn stored(&self) -> u32 {
        self.consumed - self.dropped
    }

    /// True when the deadline cut the payload short.
    pub fn is_truncated(&self) -> bool {
        self.consumed < self.declared
    }
}

/// Copy the payload announced by `header` from `port` into its channel.
///
/// Reads exactly `header.len` bytes unless `deadline` (the one the header
/// scan started) runs out first, in which case the short count is reported
/// and nothing else happens. A byte the channel buffer rejects still counts
/// as consumed.
pub fn drain_payload<P, C>(
    port: &mut P,
    pool: &mut ChannelPool,
    clock: &C,
    deadline: &Deadline,
    header: Header,
) -> PacketReport
where
    P: SerialPort + ?Sized,
    C: Clock + ?Sized,
{
    let mut report = PacketReport::new(header);
    let Some(buffer) = pool.get_or_create(header.channel) else {
        return report;
    };

    while report.consumed < header.len && !deadline.expired(clock) {
        while report.consumed < header.len {
            let Some(byte) = port.read_byte() else {
                break;
            };
            if !buffer.offer(byte) {
                report.dropped += 1;
                warn!(
                    channel = header.channel,
                    name = channel_name(header.channel),
                    byte,
                    "channel buffer full, dropping byte"
                );
            }
            report.consumed += 1;
        }

        if report.consumed < header.len {
            if deadline.is_immediate() {
                break;
            }
            clock.idle();
        }
    }

    if report.is_truncated() {
        debug!(
            channel = report.channel,
            declared = report.declared,
            consumed = report.consumed,
            "payload truncated by deadline"
        );
    }
    report
}
