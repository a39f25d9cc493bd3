use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::builder::TypedValueParser;
use clap::{Args, Subcommand};
use espmux_transport::{StreamPort, TransportError};

use crate::exit::{io_error, transport_error, CliResult};
use crate::output::OutputFormat;

pub mod demux;
pub mod listen;
pub mod scan;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Demultiplex a captured byte stream into per-channel packets.
    Demux(DemuxArgs),
    /// Read a live serial device and print packets as they arrive.
    Listen(ListenArgs),
    /// List every +IPD header in a capture without buffering payloads.
    Scan(ScanArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Demux(args) => demux::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Scan(args) => scan::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DemuxArgs {
    /// Capture file to read ("-" for stdin).
    pub input: PathBuf,
    /// Only print these channels (comma-separated, 0-4 mux, 5 default).
    #[arg(long, value_delimiter = ',', value_parser = clap::value_parser!(u8).range(0..=5))]
    pub channels: Option<Vec<u8>>,
    /// Per-channel buffer capacity in bytes.
    #[arg(long, default_value = "2048", value_parser = clap::value_parser!(u64).range(1..).map(|v| v as usize))]
    pub buffer_capacity: usize,
    /// Budget for each reassembly pass in milliseconds.
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u32).range(10..))]
    pub timeout_ms: u32,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Serial device to open (e.g. /dev/ttyUSB0, COM3).
    pub device: String,
    /// Line speed in baud.
    #[arg(long, default_value = "115200")]
    pub baud: u32,
    /// Only print these channels (comma-separated, 0-4 mux, 5 default).
    #[arg(long, value_delimiter = ',', value_parser = clap::value_parser!(u8).range(0..=5))]
    pub channels: Option<Vec<u8>>,
    /// Exit after printing N packets.
    #[arg(long)]
    pub count: Option<usize>,
    /// Per-channel buffer capacity in bytes.
    #[arg(long, default_value = "2048", value_parser = clap::value_parser!(u64).range(1..).map(|v| v as usize))]
    pub buffer_capacity: usize,
    /// Budget for each reassembly pass in milliseconds.
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u32).range(10..))]
    pub timeout_ms: u32,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Capture file to read ("-" for stdin).
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Wrap a capture file (or stdin) as a serial port.
pub(crate) fn open_input(path: &Path) -> CliResult<StreamPort<Box<dyn Read>>> {
    if is_stdin(path) {
        return Ok(StreamPort::new(Box::new(std::io::stdin())));
    }
    let file = File::open(path).map_err(|source| {
        transport_error(
            "cannot open input",
            TransportError::Open {
                path: path.to_path_buf(),
                source,
            },
        )
    })?;
    Ok(StreamPort::new(Box::new(file)))
}

/// Read a whole capture file (or stdin) into memory.
pub(crate) fn read_input(path: &Path) -> CliResult<Vec<u8>> {
    let mut data = Vec::new();
    if is_stdin(path) {
        std::io::stdin()
            .read_to_end(&mut data)
            .map_err(|err| io_error("cannot read stdin", err))?;
        return Ok(data);
    }
    let mut file = File::open(path).map_err(|source| {
        transport_error(
            "cannot open input",
            TransportError::Open {
                path: path.to_path_buf(),
                source,
            },
        )
    })?;
    file.read_to_end(&mut data)
        .map_err(|err| io_error("cannot read input", err))?;
    Ok(data)
}

/// True when `channel` passes an optional `--channels` filter.
pub(crate) fn wanted(filter: Option<&[u8]>, channel: u8) -> bool {
    filter.is_none_or(|channels| channels.contains(&channel))
}
