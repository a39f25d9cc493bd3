use espmux_transport::SerialPort;
use tracing::debug;

use crate::config::ReassemblyConfig;
use crate::deadline::{Clock, Deadline};
use crate::drain::{drain_payload, PacketReport};
use crate::header::HeaderScanner;
use crate::pool::ChannelPool;

/// Turns raw port bytes into per-channel payloads, one packet per pass.
#[derive(Debug, Clone, Default)]
pub struct Reassembler {
    config: ReassemblyConfig,
}

impl Reassembler {
    pub fn new(config: ReassemblyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReassemblyConfig {
        &self.config
    }

    /// A pool sized for this configuration.
    ///
    /// # Panics
    ///
    /// Panics if `buffer_capacity` is zero.
    pub fn new_pool(&self) -> ChannelPool {
        ChannelPool::new(self.config.buffer_capacity)
    }

    /// Run one reassembly pass.
    ///
    /// Skips (consuming nothing) while fewer than `min_available` bytes are
    /// waiting. Otherwise reads bytes until a header resolves, then drains its
    /// payload into `pool`. Both phases share one `timeout_ms` budget. Bytes
    /// read ahead of the header are discarded.
    ///
    /// Returns `None` if no valid header arrived in time or the first header
    /// was malformed.
    pub fn reassemble<P, C>(
        &self,
        port: &mut P,
        pool: &mut ChannelPool,
        clock: &C,
        timeout_ms: u32,
    ) -> Option<PacketReport>
    where
        P: SerialPort + ?Sized,
        C: Clock + ?Sized,
    {
        let waiting = port.available();
        if waiting < self.config.min_available {
            debug!(waiting, "too few bytes waiting, skipping reassembly");
            return None;
        }

        let deadline = Deadline::start(clock, timeout_ms);
        let mut scanner = HeaderScanner::new(self.config.max_header_len);
        // An immediate pass only looks at what was already waiting.
        let mut budget = deadline.is_immediate().then_some(waiting);

        let header = loop {
            if deadline.expired(clock) {
                debug!(
                    discarded = scanner.discarded(),
                    partial = scanner.in_header(),
                    "no header before deadline"
                );
                return None;
            }

            let Some(byte) = port.read_byte() else {
                if deadline.is_immediate() {
                    return None;
                }
                clock.idle();
                continue;
            };

            match scanner.push(byte) {
                Ok(Some(header)) => break header,
                Ok(None) => {}
                Err(err) => {
                    debug!(error = %err, "abandoning malformed header");
                    return None;
                }
            }

            if let Some(left) = budget.as_mut() {
                *left -= 1;
                if *left == 0 {
                    return None;
                }
            }
        };

        debug!(
            channel = header.channel,
            len = header.len,
            discarded = scanner.discarded(),
            "header resolved"
        );

        let mut report = drain_payload(port, pool, clock, &deadline, header);
        report.skipped = scanner.discarded();
        debug!(
            channel = report.channel,
            consumed = report.consumed,
            dropped = report.dropped,
            "packet stored"
        );
        Some(report)
    }

    /// [`reassemble`](Self::reassemble) reduced to the number of payload
    /// bytes taken off the port (0 when nothing was found).
    pub fn store_packet<P, C>(
        &self,
        port: &mut P,
        pool: &mut ChannelPool,
        clock: &C,
        timeout_ms: u32,
    ) -> u32
    where
        P: SerialPort + ?Sized,
        C: Clock + ?Sized,
    {
        self.reassemble(port, pool, clock, timeout_ms)
            .map_or(0, |report| report.consumed)
    }
}

#[cfg(test)]
mod tests {
    use espmux_transport::MemoryPort;

    use super::*;
    use crate::channel::{ChannelId, DEFAULT_CHANNEL};
    use crate::deadline::StepClock;

    const TIMEOUT_MS: u32 = 1000;

    fn reassembler(capacity: usize) -> Reassembler {
        Reassembler::new(ReassemblyConfig {
            buffer_capacity: capacity,
            ..ReassemblyConfig::default()
        })
    }

    fn contents(pool: &mut ChannelPool, id: ChannelId) -> Vec<u8> {
        let mut out = vec![0u8; pool.capacity()];
        let n = pool.read_into(id, &mut out);
        out.truncate(n);
        out
    }

    fn run(capacity: usize, wire: &[u8]) -> (Option<PacketReport>, ChannelPool, MemoryPort) {
        let engine = reassembler(capacity);
        let mut pool = engine.new_pool();
        let mut port = MemoryPort::from_bytes(wire);
        let clock = StepClock::new();
        let report = engine.reassemble(&mut port, &mut pool, &clock, TIMEOUT_MS);
        (report, pool, port)
    }

    #[test]
    fn junk_header_payload_tail() {
        let engine = reassembler(5);
        let mut pool = engine.new_pool();
        let mut port = MemoryPort::from_bytes(b"junk+IPD,2,5:helloTAIL");
        let clock = StepClock::new();
        assert!(!pool.is_allocated(2));

        let report = engine
            .reassemble(&mut port, &mut pool, &clock, TIMEOUT_MS)
            .unwrap();
        assert_eq!(report.channel, 2);
        assert_eq!(report.consumed, 5);
        assert_eq!(report.skipped, 4);
        assert_eq!(contents(&mut pool, 2), b"hello");
        assert_eq!(port.pending(), b"TAIL");
    }

    #[test]
    fn header_without_id_lands_on_default_channel() {
        let (report, mut pool, mut port) = run(16, b"+IPD,3:abc");

        let report = report.unwrap();
        assert_eq!(report.channel, DEFAULT_CHANNEL);
        assert_eq!(report.consumed, 3);
        assert_eq!(contents(&mut pool, DEFAULT_CHANNEL), b"abc");
        assert_eq!(port.available(), 0);
    }

    #[test]
    fn overflow_counts_consumed_bytes() {
        let (report, mut pool, _) = run(2, b"+IPD,4:wxyz");

        let report = report.unwrap();
        assert_eq!(report.consumed, 4);
        assert_eq!(report.dropped, 2);
        assert_eq!(pool.buffered(DEFAULT_CHANNEL), 2);
        assert_eq!(contents(&mut pool, DEFAULT_CHANNEL), b"wx");
    }

    #[test]
    fn stores_declared_length_on_every_mux_channel() {
        for id in 0..=4u8 {
            let wire = format!("\r\nOK\r\n+IPD,{id},7:payload");
            let (report, pool, _) = run(16, wire.as_bytes());
            assert_eq!(report.map(|r| r.consumed), Some(7), "channel {id}");
            assert_eq!(pool.buffered(id), 7);
            for other in (0..=5u8).filter(|&other| other != id) {
                assert_eq!(pool.buffered(other), 0);
            }
        }
    }

    #[test]
    fn malformed_headers_store_nothing() {
        let cases: &[&str] = &[
            "+IPD,0:abcdef",
            "+IPD,1,0:abcdef",
            "+IPD,7,3:abcdef",
            "+IPD,x,3:abcdef",
            "+IPD,1,abc:abcdef",
            "+IPD,-3:abcdef",
        ];
        for wire in cases {
            let (report, pool, _) = run(16, wire.as_bytes());
            assert!(report.is_none(), "{wire}");
            assert_eq!(pool.first_pending(), None, "{wire}");
        }
    }

    #[test]
    fn truncated_payload_reports_short_count() {
        let (report, mut pool, _) = run(16, b"+IPD,1,10:abcd");

        let report = report.unwrap();
        assert_eq!(report.consumed, 4);
        assert!(report.is_truncated());
        assert_eq!(contents(&mut pool, 1), b"abcd");
        assert_eq!(pool.buffered(DEFAULT_CHANNEL), 0);
    }

    #[test]
    fn fewer_than_five_bytes_consumes_nothing() {
        let (report, _, port) = run(16, b"+IPD");
        assert!(report.is_none());
        assert_eq!(port.consumed(), 0);
    }

    #[test]
    fn noise_without_header_is_discarded() {
        let (report, pool, mut port) = run(16, b"\r\nSEND OK\r\n");
        assert!(report.is_none());
        assert_eq!(port.available(), 0);
        assert_eq!(pool.first_pending(), None);
    }

    #[test]
    fn header_split_across_deadline_is_abandoned() {
        let engine = reassembler(16);
        let mut pool = engine.new_pool();
        let mut port = MemoryPort::from_bytes(b"+IPD,2,");
        let clock = StepClock::new();

        assert_eq!(engine.store_packet(&mut port, &mut pool, &clock, 20), 0);

        // The rest of the header arriving later does not resume the old scan.
        port.feed(b"3:abc");
        assert_eq!(engine.store_packet(&mut port, &mut pool, &clock, 20), 0);
        assert_eq!(pool.first_pending(), None);
    }

    #[test]
    fn immediate_pass_uses_only_waiting_bytes() {
        let engine = reassembler(16);
        let mut pool = engine.new_pool();
        let mut port = MemoryPort::from_bytes(b"+IPD,1,3:ab");
        let clock = StepClock::new();

        let report = engine.reassemble(&mut port, &mut pool, &clock, 0).unwrap();
        assert_eq!(report.consumed, 2);
        assert!(report.is_truncated());
        assert!(clock.elapsed().as_millis() < 100);
    }

    #[test]
    fn consecutive_packets_need_one_pass_each() {
        let engine = reassembler(16);
        let mut pool = engine.new_pool();
        let mut port = MemoryPort::from_bytes(b"+IPD,0,2:hi\r\n+IPD,3,3:you");
        let clock = StepClock::new();

        assert_eq!(engine.store_packet(&mut port, &mut pool, &clock, TIMEOUT_MS), 2);
        assert_eq!(pool.buffered(3), 0);
        assert_eq!(engine.store_packet(&mut port, &mut pool, &clock, TIMEOUT_MS), 3);

        assert_eq!(contents(&mut pool, 0), b"hi");
        assert_eq!(contents(&mut pool, 3), b"you");
    }

    #[test]
    fn buffered_bytes_accumulate_across_packets() {
        let engine = reassembler(16);
        let mut pool = engine.new_pool();
        let mut port = MemoryPort::from_bytes(b"+IPD,2:ab+IPD,2:cd");
        let clock = StepClock::new();

        engine.store_packet(&mut port, &mut pool, &clock, TIMEOUT_MS);
        engine.store_packet(&mut port, &mut pool, &clock, TIMEOUT_MS);

        assert_eq!(contents(&mut pool, DEFAULT_CHANNEL), b"abcd");
    }
}
