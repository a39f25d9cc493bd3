//! `+IPD` packet reassembly with channel multiplexing.
//!
//! This is the stateful core of espmux. The co-processor interleaves command
//! responses, status lines and inbound network data on a single serial link.
//! Inbound data is framed as:
//! - `+IPD,<id>,<len>:<payload>`: multiplexed connection `id` (0-4)
//! - `+IPD,<len>:<payload>`: single-connection mode (default channel 5)
//!
//! The [`Reassembler`] pulls bytes off a [`SerialPort`](espmux_transport::SerialPort),
//! finds the next header and copies the payload into that channel's bounded
//! buffer in the [`ChannelPool`]. Everything that is not a header or payload
//! is discarded.

pub mod buffer;
pub mod channel;
pub mod config;
pub mod deadline;
pub mod drain;
pub mod error;
pub mod header;
pub mod pool;
pub mod reassembly;

pub use buffer::RingBuffer;
pub use channel::{channel_name, ChannelId, CHANNEL_COUNT, DEFAULT_CHANNEL, MAX_MUX_CHANNEL};
pub use config::{ReassemblyConfig, DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_HEADER_LEN, MIN_AVAILABLE};
pub use deadline::{Clock, Deadline, StepClock, SystemClock};
pub use drain::{drain_payload, PacketReport};
pub use error::{HeaderError, Result};
pub use header::{find_header, Header, HeaderMatch, HeaderScanner, LONGEST_HEADER, TOKEN};
pub use pool::ChannelPool;
pub use reassembly::Reassembler;
