//! Channel IDs.
//!
//! Ids 0-4 are the co-processor's multiplexed connections (`AT+CIPMUX=1`).
//! Id 5 is the single-connection channel used when headers carry no id.

pub type ChannelId = u8;

/// Highest multiplexed connection id.
pub const MAX_MUX_CHANNEL: ChannelId = 4;

/// Channel for `+IPD,<len>:` packets.
pub const DEFAULT_CHANNEL: ChannelId = 5;

/// Number of channel slots (five multiplexed plus the default).
pub const CHANNEL_COUNT: usize = DEFAULT_CHANNEL as usize + 1;

/// Returns a human-readable name for a channel ID.
pub fn channel_name(id: ChannelId) -> &'static str {
    match id {
        0 => "MUX0",
        1 => "MUX1",
        2 => "MUX2",
        3 => "MUX3",
        4 => "MUX4",
        DEFAULT_CHANNEL => "DEFAULT",
        _ => "INVALID",
    }
}

/// Returns true for ids the pool accepts.
pub fn is_valid(id: ChannelId) -> bool {
    id <= DEFAULT_CHANNEL
}

/// Returns true for multiplexed connection ids.
pub fn is_mux(id: ChannelId) -> bool {
    id <= MAX_MUX_CHANNEL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_ranges() {
        assert_eq!(channel_name(0), "MUX0");
        assert_eq!(channel_name(4), "MUX4");
        assert_eq!(channel_name(DEFAULT_CHANNEL), "DEFAULT");
        assert_eq!(channel_name(6), "INVALID");

        assert!(is_mux(4));
        assert!(!is_mux(DEFAULT_CHANNEL));
        assert!(is_valid(DEFAULT_CHANNEL));
        assert!(!is_valid(6));
        assert_eq!(CHANNEL_COUNT, 6);
    }
}
