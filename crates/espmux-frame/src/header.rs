use bytes::{Buf, BufMut, BytesMut};

use crate::channel::{ChannelId, DEFAULT_CHANNEL, MAX_MUX_CHANNEL};
use crate::error::{HeaderError, Result};

/// Literal that opens every inbound data header.
pub const TOKEN: &[u8] = b"+IPD,";

/// Longest header that can parse, with leading zeros collapsed:
/// `+IPD,4,4294967295:`.
pub const LONGEST_HEADER: usize = 18;

const TERMINATOR: u8 = b':';
const SEPARATOR: u8 = b',';

/// A resolved `+IPD` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Destination channel: 0-4, or 5 when the header carries no id.
    pub channel: ChannelId,
    /// Declared payload length, always > 0.
    pub len: u32,
}

/// The first header occurrence found in a byte window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMatch {
    /// Offset of the `+` that opens the header.
    pub start: usize,
    /// Offset just past the terminating `:`.
    pub end: usize,
    pub header: Result<Header>,
}

/// Find and parse the first complete header in `window`.
///
/// Returns `None` while the window holds no `+IPD,` token, or holds one whose
/// `:` has not arrived. Only the first token counts: if that header is
/// malformed, the match carries the error instead of skipping ahead.
///
/// ```text
/// +IPD,<id>,<len>:   a ',' before the ':' means an explicit id
/// +IPD,<len>:        otherwise the default channel
/// ```
pub fn find_header(window: &[u8]) -> Option<HeaderMatch> {
    let start = window
        .windows(TOKEN.len())
        .position(|candidate| candidate == TOKEN)?;
    let fields_at = start + TOKEN.len();
    let colon = window[fields_at..]
        .iter()
        .position(|&b| b == TERMINATOR)?;
    let fields = &window[fields_at..fields_at + colon];

    Some(HeaderMatch {
        start,
        end: fields_at + colon + 1,
        header: parse_fields(fields),
    })
}

/// Parse the bytes between `+IPD,` and `:`.
fn parse_fields(fields: &[u8]) -> Result<Header> {
    match fields.iter().position(|&b| b == SEPARATOR) {
        Some(comma) => {
            let raw_id = &fields[..comma];
            let channel = parse_decimal(raw_id)
                .filter(|&id| id <= u32::from(MAX_MUX_CHANNEL))
                .ok_or_else(|| HeaderError::InvalidChannel {
                    raw: lossy(raw_id),
                })?;
            let len = parse_len(&fields[comma + 1..])?;
            Ok(Header {
                channel: channel as ChannelId,
                len,
            })
        }
        None => Ok(Header {
            channel: DEFAULT_CHANNEL,
            len: parse_len(fields)?,
        }),
    }
}

fn parse_len(raw: &[u8]) -> Result<u32> {
    if raw.is_empty() {
        return Err(HeaderError::MissingLength);
    }
    match parse_decimal(raw) {
        Some(0) => Err(HeaderError::ZeroLength),
        Some(len) => Ok(len),
        None => Err(HeaderError::InvalidLength { raw: lossy(raw) }),
    }
}

/// Strict unsigned base-10: digits only, no sign, no whitespace, fits in u32.
fn parse_decimal(raw: &[u8]) -> Option<u32> {
    if raw.is_empty() {
        return None;
    }
    raw.iter().try_fold(0u32, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add(u32::from(b - b'0'))
    })
}

fn lossy(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

/// Incremental header scanner, fed one byte at a time.
///
/// Accepts and rejects exactly what [`find_header`] would on the bytes pushed
/// so far, but only keeps what can still matter: the last few bytes while
/// looking for the token, then the header fields. Bytes that cannot be part
/// of the first header are counted as discarded.
///
/// Leading zeros in a field are collapsed as they arrive, so the length cap
/// only counts significant digits. The cap is never below [`LONGEST_HEADER`];
/// fields that outgrow it can no longer parse, and rejecting them early
/// changes when the pass gives up but not its outcome.
#[derive(Debug)]
pub struct HeaderScanner {
    window: BytesMut,
    in_header: bool,
    discarded: usize,
    max_header_len: usize,
}

impl HeaderScanner {
    pub fn new(max_header_len: usize) -> Self {
        Self {
            window: BytesMut::with_capacity(max_header_len),
            in_header: false,
            discarded: 0,
            max_header_len: max_header_len.max(LONGEST_HEADER),
        }
    }

    /// Feed one byte.
    ///
    /// `Ok(Some(header))` once the `:` completes a valid header; the next byte
    /// on the port is the first payload byte. `Err` means the first header is
    /// malformed and the attempt should be abandoned.
    pub fn push(&mut self, byte: u8) -> Result<Option<Header>> {
        if !self.in_header {
            self.window.put_u8(byte);
            if self.window.ends_with(TOKEN) {
                self.discarded += self.window.len() - TOKEN.len();
                self.window.clear();
                self.in_header = true;
            } else if self.window.len() >= TOKEN.len() {
                // Only a proper prefix of the token can still complete it.
                let excess = self.window.len() - (TOKEN.len() - 1);
                self.window.advance(excess);
                self.discarded += excess;
            }
            return Ok(None);
        }

        if byte == TERMINATOR {
            return parse_fields(&self.window).map(Some);
        }

        let field_start = self
            .window
            .iter()
            .rposition(|&b| b == SEPARATOR)
            .map_or(0, |comma| comma + 1);
        if self.window[field_start..] == [b'0'] && byte.is_ascii_digit() {
            // "0" followed by a digit: the zero is not significant.
            self.window.truncate(field_start);
        }
        self.window.put_u8(byte);
        if TOKEN.len() + self.window.len() + 1 > self.max_header_len {
            return Err(HeaderError::TooLong {
                max: self.max_header_len,
            });
        }
        Ok(None)
    }

    /// True once the token has been seen and fields are being collected.
    pub fn in_header(&self) -> bool {
        self.in_header
    }

    /// Bytes pushed that turned out to be noise ahead of the token.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Start over, forgetting any partial header.
    pub fn reset(&mut self) {
        self.window.clear();
        self.in_header = false;
        self.discarded = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_HEADER_LEN;

    fn scan(input: &[u8]) -> (usize, Option<Result<Header>>) {
        let mut scanner = HeaderScanner::new(DEFAULT_MAX_HEADER_LEN);
        for (i, &b) in input.iter().enumerate() {
            match scanner.push(b) {
                Ok(None) => {}
                Ok(Some(header)) => return (i + 1, Some(Ok(header))),
                Err(err) => return (i + 1, Some(Err(err))),
            }
        }
        (input.len(), None)
    }

    #[test]
    fn explicit_channel_header() {
        let m = find_header(b"junk+IPD,2,5:helloTAIL").unwrap();
        assert_eq!(m.start, 4);
        assert_eq!(m.end, 13);
        assert_eq!(m.header, Ok(Header { channel: 2, len: 5 }));
    }

    #[test]
    fn implicit_channel_header() {
        let m = find_header(b"+IPD,3:abc").unwrap();
        assert_eq!(m.start, 0);
        assert_eq!(m.end, 7);
        assert_eq!(
            m.header,
            Ok(Header {
                channel: DEFAULT_CHANNEL,
                len: 3
            })
        );
    }

    #[test]
    fn incomplete_windows_have_no_match() {
        assert!(find_header(b"").is_none());
        assert!(find_header(b"\r\nOK\r\n").is_none());
        assert!(find_header(b"+IPD").is_none());
        assert!(find_header(b"+IPD,1,12").is_none());
    }

    #[test]
    fn comma_after_colon_does_not_make_an_id() {
        let m = find_header(b"+IPD,4:a,b,").unwrap();
        assert_eq!(
            m.header,
            Ok(Header {
                channel: DEFAULT_CHANNEL,
                len: 4
            })
        );
    }

    #[test]
    fn malformed_fields_are_rejected() {
        let cases: &[(&str, HeaderError)] = &[
            ("+IPD,5,3:", HeaderError::InvalidChannel { raw: "5".into() }),
            ("+IPD,x,3:", HeaderError::InvalidChannel { raw: "x".into() }),
            ("+IPD,,3:", HeaderError::InvalidChannel { raw: "".into() }),
            ("+IPD,-1,3:", HeaderError::InvalidChannel { raw: "-1".into() }),
            ("+IPD,1,0:", HeaderError::ZeroLength),
            ("+IPD,0:", HeaderError::ZeroLength),
            ("+IPD,1,:", HeaderError::MissingLength),
            ("+IPD,:", HeaderError::MissingLength),
            ("+IPD,abc:", HeaderError::InvalidLength { raw: "abc".into() }),
            ("+IPD,1,-4:", HeaderError::InvalidLength { raw: "-4".into() }),
            ("+IPD,1,2,3:", HeaderError::InvalidLength { raw: "2,3".into() }),
            (
                "+IPD,99999999999:",
                HeaderError::InvalidLength {
                    raw: "99999999999".into(),
                },
            ),
        ];
        for (input, expected) in cases {
            let m = find_header(input.as_bytes()).unwrap();
            assert_eq!(m.header.as_ref(), Err(expected), "input {input:?}");
        }
    }

    #[test]
    fn only_first_token_counts() {
        // The first header is bad; a valid one later does not rescue it.
        let m = find_header(b"+IPD,9,1:x+IPD,1,1:y").unwrap();
        assert_eq!(m.start, 0);
        assert!(m.header.is_err());
    }

    #[test]
    fn scanner_matches_find_header() {
        let inputs: &[&[u8]] = &[
            b"junk+IPD,2,5:hello",
            b"+IPD,3:abc",
            b"\r\nOK\r\n+IPD,0,12:payload",
            b"++IPD,1,1:z",
            b"+IP+IPD,4,2:ok",
            b"+IPD,+IPD,2,3:abc",
            b"+IPD,7,1:x",
            b"+IPD,1,0:",
            b"+IPD,abc:",
            b"+IPD,4,4294967295:",
            b"+IPD,1,4294967296:",
        ];
        for input in inputs {
            let expected = find_header(input).expect("fixture has a complete header");
            let (consumed, outcome) = scan(input);
            assert_eq!(consumed, expected.end, "input {input:?}");
            assert_eq!(outcome, Some(expected.header), "input {input:?}");
        }
    }

    #[test]
    fn scanner_counts_discarded_noise() {
        let mut scanner = HeaderScanner::new(DEFAULT_MAX_HEADER_LEN);
        for &b in b"\r\nSEND OK\r\n+IPD," {
            assert_eq!(scanner.push(b), Ok(None));
        }
        assert!(scanner.in_header());
        assert_eq!(scanner.discarded(), 11);

        scanner.reset();
        assert!(!scanner.in_header());
        assert_eq!(scanner.discarded(), 0);
    }

    #[test]
    fn scanner_window_stays_bounded_on_noise() {
        let mut scanner = HeaderScanner::new(DEFAULT_MAX_HEADER_LEN);
        for _ in 0..10_000 {
            assert_eq!(scanner.push(b'.'), Ok(None));
        }
        assert!(scanner.window.len() < TOKEN.len());
        assert_eq!(scanner.discarded(), 10_000 - scanner.window.len());
    }

    #[test]
    fn scanner_rejects_overlong_header() {
        let input = b"+IPD,1,12345678901234567890:abcde";
        let (consumed, outcome) = scan(input);
        assert_eq!(
            outcome,
            Some(Err(HeaderError::TooLong {
                max: DEFAULT_MAX_HEADER_LEN
            }))
        );
        assert_eq!(consumed, DEFAULT_MAX_HEADER_LEN);
        // A full rescan rejects it too, only later.
        assert!(find_header(input).unwrap().header.is_err());
    }

    #[test]
    fn scanner_accepts_leading_zeros_like_find_header() {
        let inputs: &[&[u8]] = &[
            b"+IPD,1,00000000000000000003:abc",
            b"+IPD,0000000000000000000000000002,0004:abcd",
            b"+IPD,000000000000000000000000000000:",
            b"+IPD,00,0000000000000000000000001:x",
        ];
        for input in inputs {
            let expected = find_header(input).expect("fixture has a complete header");
            let (consumed, outcome) = scan(input);
            assert_eq!(consumed, expected.end, "input {input:?}");
            assert_eq!(outcome, Some(expected.header), "input {input:?}");
        }
    }

    #[test]
    fn small_cap_is_raised_to_longest_header() {
        let mut scanner = HeaderScanner::new(8);
        let mut outcome = Ok(None);
        for &b in b"+IPD,4,4294967295:" {
            outcome = scanner.push(b);
        }
        assert_eq!(
            outcome,
            Ok(Some(Header {
                channel: 4,
                len: u32::MAX
            }))
        );
    }

    #[test]
    fn scanner_pending_until_terminator() {
        let (consumed, outcome) = scan(b"+IPD,2,10");
        assert_eq!(consumed, 9);
        assert!(outcome.is_none());
    }
}
