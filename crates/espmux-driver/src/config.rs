use espmux_frame::ReassemblyConfig;

/// Budget for explicit receives.
pub const DEFAULT_RECV_TIMEOUT_MS: u32 = 1000;

/// Budget for the opportunistic passes run by `available`, `peek`,
/// `rx_empty` and `connected`.
pub const DEFAULT_PROBE_TIMEOUT_MS: u32 = 100;

/// Configuration for an [`EspLink`](crate::EspLink).
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Timeout for `recv`/`read` in milliseconds. Default: 1000.
    pub recv_timeout_ms: u32,
    /// Timeout for opportunistic reassembly in milliseconds. Default: 100.
    pub probe_timeout_ms: u32,
    /// Buffer and scanner settings.
    pub reassembly: ReassemblyConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            recv_timeout_ms: DEFAULT_RECV_TIMEOUT_MS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            reassembly: ReassemblyConfig::default(),
        }
    }
}
