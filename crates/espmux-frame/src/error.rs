/// Reasons a `+IPD` header is rejected.
///
/// A rejected header ends the reassembly attempt with no data stored; these
/// values only travel from the scanner to the reassembly loop and into logs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    /// Nothing between the delimiters where the length should be.
    #[error("header has no payload length")]
    MissingLength,

    /// The length field is not a base-10 integer that fits in 32 bits.
    #[error("invalid payload length {raw:?}")]
    InvalidLength { raw: String },

    /// The length field parsed as zero.
    #[error("payload length must be positive")]
    ZeroLength,

    /// The id field is not a number in 0-4.
    #[error("invalid channel id {raw:?} (expected 0-4)")]
    InvalidChannel { raw: String },

    /// The header grew past the longest legal header without a `:`.
    #[error("header exceeds {max} bytes without terminator")]
    TooLong { max: usize },
}

pub type Result<T> = std::result::Result<T, HeaderError>;
