use espmux_driver::{DriverConfig, EspLink};
use espmux_frame::{ReassemblyConfig, StepClock};
use espmux_transport::SerialPort;
use tracing::{debug, info};

use crate::cmd::{open_input, wanted, DemuxArgs};
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: DemuxArgs, format: OutputFormat) -> CliResult<i32> {
    let port = open_input(&args.input)?;
    let config = DriverConfig {
        reassembly: ReassemblyConfig {
            buffer_capacity: args.buffer_capacity,
            ..ReassemblyConfig::default()
        },
        ..DriverConfig::default()
    };
    let min_available = config.reassembly.min_available;

    // Captures replay at whatever speed the file reads; time is simulated.
    let mut link = EspLink::with_clock(port, StepClock::new(), config);

    let mut packets = 0usize;
    loop {
        let Some(report) = link.next_packet(args.timeout_ms) else {
            if link.get_mut().available() < min_available {
                break;
            }
            continue;
        };
        packets += 1;

        let payload = link.drain_channel(report.channel);
        if !wanted(args.channels.as_deref(), report.channel) {
            debug!(channel = report.channel, "filtered out");
            continue;
        }
        print_packet(&report, &payload, format);
    }

    if let Some(err) = link.get_mut().take_error() {
        return Err(transport_error("read failed", err));
    }

    info!(
        packets,
        trailing = link.get_mut().available(),
        "capture exhausted"
    );
    Ok(SUCCESS)
}
