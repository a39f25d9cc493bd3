use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use espmux_driver::{DriverConfig, EspLink};
use espmux_frame::ReassemblyConfig;
use espmux_transport::{DevicePort, SerialPort};
use tracing::info;

use crate::cmd::{wanted, ListenArgs};
use crate::exit::{transport_error, CliError, CliResult, SUCCESS};
use crate::output::{print_packet, OutputFormat};

const IDLE_SLEEP: Duration = Duration::from_millis(10);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let port = DevicePort::open(&args.device, args.baud)
        .map_err(|err| transport_error("cannot open device", err))?;
    info!(device = %args.device, baud = args.baud, "listening");

    let config = DriverConfig {
        reassembly: ReassemblyConfig {
            buffer_capacity: args.buffer_capacity,
            ..ReassemblyConfig::default()
        },
        ..DriverConfig::default()
    };
    let mut link = EspLink::with_config(port, config);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        let Some(report) = link.next_packet(args.timeout_ms) else {
            if link.get_ref().is_closed() {
                break;
            }
            std::thread::sleep(IDLE_SLEEP);
            continue;
        };

        let payload = link.drain_channel(report.channel);
        if !wanted(args.channels.as_deref(), report.channel) {
            continue;
        }
        print_packet(&report, &payload, format);
        printed = printed.saturating_add(1);

        if args.count.is_some_and(|count| printed >= count) {
            return Ok(SUCCESS);
        }
    }

    if let Some(err) = link.get_mut().take_error() {
        return Err(transport_error("read failed", err));
    }
    if link.get_mut().available() > 0 {
        info!("stopped with unframed bytes pending");
    }
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
