use crate::error::Result;

const STATUS_PREFIX: &str = "STATUS:";

/// Connection state reported by `AT+CIPSTATUS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Associated with an access point and holding an IP (`STATUS:2`).
    GotIp,
    /// A TCP/UDP connection is open (`STATUS:3`).
    Connected,
    /// The connection was closed (`STATUS:4`).
    Disconnected,
    /// Not associated with an access point (`STATUS:5`).
    NoWifi,
    /// Any other code.
    Other(u8),
}

impl LinkStatus {
    pub fn from_code(code: u8) -> Self {
        match code {
            2 => Self::GotIp,
            3 => Self::Connected,
            4 => Self::Disconnected,
            5 => Self::NoWifi,
            other => Self::Other(other),
        }
    }

    /// Extract the status from a raw `AT+CIPSTATUS` reply.
    ///
    /// Looks for the first `STATUS:<n>`; returns `None` when there is none.
    pub fn parse(reply: &str) -> Option<Self> {
        let at = reply.find(STATUS_PREFIX)? + STATUS_PREFIX.len();
        let digits: &str = {
            let rest = &reply[at..];
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            &rest[..end]
        };
        digits.parse::<u8>().ok().map(Self::from_code)
    }

    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

/// Issues the status query on behalf of [`EspLink::connected`](crate::EspLink::connected).
///
/// Implemented by whatever owns the AT command side of the link. The reply
/// is returned verbatim.
pub trait StatusQuery {
    fn query_status(&mut self) -> Result<String>;
}

impl<F> StatusQuery for F
where
    F: FnMut() -> Result<String>,
{
    fn query_status(&mut self) -> Result<String> {
        self()
    }
}
