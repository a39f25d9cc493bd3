use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use espmux_frame::{
    channel, ChannelId, ChannelPool, Clock, PacketReport, Reassembler, SystemClock,
    DEFAULT_CHANNEL,
};
use espmux_transport::SerialPort;
use tracing::{debug, trace, warn};

use crate::channel::Channel;
use crate::config::DriverConfig;
use crate::error::{DriverError, Result};
use crate::status::{LinkStatus, StatusQuery};

const FRAME_START: u8 = b'+';

/// What a call to [`EspLink::rx_empty`] threw away and kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscardReport {
    /// Port bytes thrown away, whether dropped here or by a pass.
    pub discarded: usize,
    /// Packets reassembled on the way.
    pub packets: usize,
    /// Payload bytes those packets put into channel buffers.
    pub stored: u64,
}

/// A serial link to the co-processor plus its per-channel receive buffers.
///
/// Single-threaded: every operation takes `&mut self` and may poll the port
/// for up to its timeout before returning.
pub struct EspLink<P, C = SystemClock> {
    port: P,
    clock: C,
    pool: ChannelPool,
    engine: Reassembler,
    config: DriverConfig,
}

impl<P: SerialPort> EspLink<P> {
    /// Attach to `port` with default configuration and the system clock.
    pub fn new(port: P) -> Self {
        Self::with_config(port, DriverConfig::default())
    }

    /// Attach to `port` with explicit configuration and the system clock.
    pub fn with_config(port: P, config: DriverConfig) -> Self {
        Self::with_clock(port, SystemClock, config)
    }
}

impl<P: SerialPort, C: Clock> EspLink<P, C> {
    /// Attach to `port`, measuring timeouts with `clock`.
    ///
    /// # Panics
    ///
    /// Panics if `config.reassembly.buffer_capacity` is zero. The same holds
    /// for [`new`](EspLink::new) and [`with_config`](EspLink::with_config).
    pub fn with_clock(port: P, clock: C, config: DriverConfig) -> Self {
        let engine = Reassembler::new(config.reassembly.clone());
        let pool = engine.new_pool();
        Self {
            port,
            clock,
            pool,
            engine,
            config,
        }
    }

    /// Run one reassembly pass and report the packet it stored, if any.
    pub fn next_packet(&mut self, timeout_ms: u32) -> Option<PacketReport> {
        self.engine
            .reassemble(&mut self.port, &mut self.pool, &self.clock, timeout_ms)
    }

    /// Run one reassembly pass; returns payload bytes taken off the port.
    pub fn store_packet(&mut self, timeout_ms: u32) -> u32 {
        self.engine
            .store_packet(&mut self.port, &mut self.pool, &self.clock, timeout_ms)
    }

    /// Receive on the default channel with the configured timeout.
    pub fn recv(&mut self, out: &mut [u8]) -> usize {
        self.recv_on(DEFAULT_CHANNEL, out, self.config.recv_timeout_ms)
    }

    /// Receive on the default channel.
    pub fn recv_timeout(&mut self, out: &mut [u8], timeout_ms: u32) -> usize {
        self.recv_on(DEFAULT_CHANNEL, out, timeout_ms)
    }

    /// Receive on channel `id`.
    ///
    /// Copies what is already buffered; if that does not fill `out`, runs one
    /// reassembly pass bounded by `timeout_ms` and copies again. The pass may
    /// store a packet for a different channel, in which case this returns
    /// short and the other channel keeps its bytes.
    pub fn recv_on(&mut self, id: ChannelId, out: &mut [u8], timeout_ms: u32) -> usize {
        if !channel::is_valid(id) {
            debug!(channel = id, "receive on invalid channel");
            return 0;
        }

        let first = self.read_from_buffer(id, out);
        if first == out.len() {
            return first;
        }

        self.store_packet(timeout_ms);
        first + self.read_from_buffer(id, &mut out[first..])
    }

    /// Copy buffered bytes for `id` into `out` without touching the port.
    pub fn read_from_buffer(&mut self, id: ChannelId, out: &mut [u8]) -> usize {
        self.pool.read_into(id, out)
    }

    /// Everything currently buffered for `id`.
    pub fn drain_channel(&mut self, id: ChannelId) -> Bytes {
        let mut out = BytesMut::zeroed(self.pool.buffered(id));
        let n = self.pool.read_into(id, &mut out);
        out.truncate(n);
        out.freeze()
    }

    /// Read one byte from the default channel.
    pub fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        if self.recv(&mut byte) == 1 {
            Some(byte[0])
        } else {
            debug!("no byte available on default channel");
            None
        }
    }

    /// Bytes buffered on the default channel.
    pub fn available(&mut self) -> usize {
        self.available_on(DEFAULT_CHANNEL)
    }

    /// Bytes buffered on `id`, running one short reassembly pass first if
    /// there are none.
    pub fn available_on(&mut self, id: ChannelId) -> usize {
        if self.pool.buffered(id) == 0 {
            self.store_packet(self.config.probe_timeout_ms);
        }
        self.pool.buffered(id)
    }

    /// Next byte on the default channel without consuming it.
    pub fn peek(&mut self) -> Option<u8> {
        self.peek_on(DEFAULT_CHANNEL)
    }

    /// Next byte on `id` without consuming it, with the same refill as
    /// [`available_on`](Self::available_on).
    pub fn peek_on(&mut self, id: ChannelId) -> Option<u8> {
        if self.pool.buffered(id) == 0 {
            self.store_packet(self.config.probe_timeout_ms);
        }
        self.pool.get(id)?.peek()
    }

    /// Empty the port ahead of issuing a command.
    ///
    /// Bytes are dropped one by one, except that a `+` triggers a reassembly
    /// pass so inbound data that arrived between commands is kept. A `+` with
    /// too little behind it to be a header is dropped like any other byte, as
    /// is one the pass could not get to before its deadline.
    ///
    /// `discarded` counts every port byte that did not end up as payload or
    /// header of a stored packet, including what a pass read and threw away.
    pub fn rx_empty(&mut self) -> DiscardReport {
        let mut report = DiscardReport::default();
        let min_available = self.engine.config().min_available;

        while self.port.available() > 0 {
            let Some(byte) = self.port.peek_byte() else {
                break;
            };

            let waiting = self.port.available();
            if byte == FRAME_START && waiting >= min_available {
                match self.next_packet(self.config.probe_timeout_ms) {
                    Some(packet) => {
                        report.packets += 1;
                        report.stored += u64::from(packet.stored());
                        report.discarded += packet.skipped;
                        continue;
                    }
                    None => {
                        let swallowed = waiting.saturating_sub(self.port.available());
                        if swallowed > 0 {
                            report.discarded += swallowed;
                            trace!(swallowed, "pass stored nothing");
                            continue;
                        }
                    }
                }
            }

            self.port.read_byte();
            report.discarded += 1;
            trace!(byte, "discarding noise");
        }

        if report.discarded > 0 || report.packets > 0 {
            debug!(
                discarded = report.discarded,
                packets = report.packets,
                stored = report.stored,
                "receive path emptied"
            );
        }
        report
    }

    /// Whether the link looks alive.
    ///
    /// Buffered data or bytes waiting on the port count as alive (the port
    /// bytes get a reassembly pass). Only when both are empty is `status`
    /// asked, and the link is up if it reports `STATUS:3`.
    pub fn connected<S: StatusQuery + ?Sized>(&mut self, status: &mut S) -> bool {
        if let Some(id) = self.pool.first_pending() {
            debug!(channel = id, "data buffered, link is up");
            return true;
        }

        let waiting = self.port.available();
        if waiting > 0 {
            debug!(waiting, "data waiting on port, link is up");
            self.store_packet(self.config.probe_timeout_ms);
            return true;
        }

        match status.query_status() {
            Ok(reply) => match LinkStatus::parse(&reply) {
                Some(state) if state.is_connected() => true,
                state => {
                    debug!(?state, reply = %reply.trim(), "link not connected");
                    false
                }
            },
            Err(err) => {
                warn!(error = %err, "status query failed");
                false
            }
        }
    }

    /// A reader bound to channel `id`.
    pub fn channel(&mut self, id: ChannelId) -> Result<Channel<'_, P, C>> {
        if !channel::is_valid(id) {
            return Err(DriverError::InvalidChannel(id));
        }
        Ok(Channel::new(self, id))
    }

    /// The channel buffers.
    pub fn pool(&self) -> &ChannelPool {
        &self.pool
    }

    /// Current driver configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Borrow the underlying port.
    pub fn get_ref(&self) -> &P {
        &self.port
    }

    /// Mutably borrow the underlying port, e.g. to hand it to the command
    /// layer between receives.
    pub fn get_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Consume the link and return the port. Buffered data is lost.
    pub fn into_inner(self) -> P {
        self.port
    }
}

/// Reads the default channel.
///
/// A receive that times out with nothing buffered yields
/// `ErrorKind::TimedOut` rather than `Ok(0)`, which would mean end of stream.
impl<P: SerialPort, C: Clock> Read for EspLink<P, C> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        read_channel(self, DEFAULT_CHANNEL, buf)
    }
}

pub(crate) fn read_channel<P: SerialPort, C: Clock>(
    link: &mut EspLink<P, C>,
    id: ChannelId,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    if buf.is_empty() {
        return Ok(0);
    }
    let timeout = link.config.recv_timeout_ms;
    match link.recv_on(id, buf, timeout) {
        0 => Err(std::io::Error::new(
            ErrorKind::TimedOut,
            format!("no data on channel {id} within {timeout} ms"),
        )),
        n => Ok(n),
    }
}

impl<P, C> std::fmt::Debug for EspLink<P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EspLink")
            .field("pool", &self.pool)
            .field("config", &self.config)
            .finish()
    }
}
