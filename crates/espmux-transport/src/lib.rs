//! Raw serial transport boundary.
//!
//! The reassembly engine only ever pulls bytes from the co-processor link; it
//! never writes. This crate defines that pull-side contract ([`SerialPort`])
//! and three implementations:
//! - [`MemoryPort`]: an in-memory FIFO, fed explicitly
//! - [`StreamPort`]: adapts any [`std::io::Read`] (capture file, pipe, socket)
//! - [`DevicePort`]: a UART opened through `serialport`
//!
//! Writing commands to the device belongs to the AT command layer, which is
//! not part of this workspace.

pub mod device;
pub mod error;
pub mod memory;
pub mod stream;
pub mod traits;

pub use device::DevicePort;
pub use error::{Result, TransportError};
pub use memory::MemoryPort;
pub use stream::StreamPort;
pub use traits::SerialPort;
