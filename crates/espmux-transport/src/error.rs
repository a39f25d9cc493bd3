use std::path::PathBuf;

/// Errors that can occur while attaching to or reading from a serial link.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the device or capture file.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
