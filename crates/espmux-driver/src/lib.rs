//! Channel read facade for an ESP8266-class WiFi co-processor.
//!
//! [`EspLink`] owns the serial port and the per-channel buffers and gives the
//! application `available`/`peek`/`read` access to each connection, running
//! a reassembly pass whenever a read finds its buffer empty.
//!
//! Issuing AT commands is left to the caller; the only command the driver
//! depends on is the status query behind [`EspLink::connected`], which is
//! supplied through the [`StatusQuery`] trait.

pub mod channel;
pub mod config;
pub mod error;
pub mod link;
pub mod status;

pub use channel::Channel;
pub use config::{DriverConfig, DEFAULT_PROBE_TIMEOUT_MS, DEFAULT_RECV_TIMEOUT_MS};
pub use error::{DriverError, Result};
pub use link::{DiscardReport, EspLink};
pub use status::{LinkStatus, StatusQuery};
