/// Errors that can occur in driver operations.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] espmux_transport::TransportError),

    /// The channel id is outside 0-5.
    #[error("channel {0} out of range (expected 0-5)")]
    InvalidChannel(u8),

    /// The status query collaborator failed.
    #[error("status query failed: {0}")]
    StatusQuery(String),
}

pub type Result<T> = std::result::Result<T, DriverError>;
