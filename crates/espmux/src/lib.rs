//! Packet reassembly and channel buffering for ESP8266 AT serial links.
//!
//! espmux sits between the UART of an ESP8266-class WiFi co-processor and the
//! application, turning the interleaved serial stream into per-connection
//! byte buffers.
//!
//! # Crate Structure
//!
//! - [`transport`]: The serial port boundary (`SerialPort`, in-memory and stream ports)
//! - [`frame`]: `+IPD` header scanning, reassembly and channel buffers
//! - [`driver`]: Channel read facade, noise discard, connectivity probe (behind `driver` feature)

/// Re-export transport types.
pub mod transport {
    pub use espmux_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use espmux_frame::*;
}

/// Re-export driver types (requires `driver` feature).
#[cfg(feature = "driver")]
pub mod driver {
    pub use espmux_driver::*;
}
