/// Per-channel buffer capacity used when none is configured.
pub const DEFAULT_BUFFER_CAPACITY: usize = 128;

/// A reassembly pass is skipped while fewer bytes than this are waiting.
/// No header can be shorter (`+IPD,` alone is five bytes).
pub const MIN_AVAILABLE: usize = 5;

/// Longest header accepted, from `+` through `:` inclusive, after leading
/// zeros are collapsed. Values below [`LONGEST_HEADER`](crate::LONGEST_HEADER)
/// are raised to it.
pub const DEFAULT_MAX_HEADER_LEN: usize = 24;

/// Configuration for the reassembly engine.
#[derive(Debug, Clone)]
pub struct ReassemblyConfig {
    /// Capacity of each channel buffer in bytes, at least 1. Default: 128.
    pub buffer_capacity: usize,
    /// Minimum bytes waiting on the port before a pass starts. Default: 5.
    pub min_available: usize,
    /// Maximum header length before it is rejected. Default: 24.
    pub max_header_len: usize,
}

impl Default for ReassemblyConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            min_available: MIN_AVAILABLE,
            max_header_len: DEFAULT_MAX_HEADER_LEN,
        }
    }
}
