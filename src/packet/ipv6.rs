use super::cursor::HeaderCursor;
use super::tcp::TCP_MIN_HDR_LEN;
use super::IPPROTO_TCP;
use crate::error::ParseError;

/// Fixed IPv6 header length
pub const IPV6_HDR_LEN: usize = 40;

/// Upper bound on extension headers walked before giving up
pub const MAX_EXTENSION_HEADERS: usize = 10;

// Next Header values
pub const NEXTHDR_HOP: u8 = 0;
pub const NEXTHDR_ROUTING: u8 = 43;
pub const NEXTHDR_FRAGMENT: u8 = 44;
pub const NEXTHDR_AUTH: u8 = 51;
pub const NEXTHDR_NONE: u8 = 59;
pub const NEXTHDR_DEST: u8 = 60;

const NEXT_HEADER_OFFSET: usize = 6;
/// next-header + length byte shared by every extension header
const EXT_PREFIX_LEN: usize = 2;
const FRAG_HDR_LEN: usize = 8;

/// Transport header located after the extension chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transport {
    pub protocol: u8,
    /// Offset of the transport header within the frame
    pub offset: usize,
}

/// Extension headers the walker knows how to skip.
///
/// "No next header" is not in this set. Nothing can follow it, so the walker
/// fails on it instead of stepping over it.
#[inline(always)]
pub fn is_extension_header(nexthdr: u8) -> bool {
    matches!(
        nexthdr,
        NEXTHDR_HOP | NEXTHDR_ROUTING | NEXTHDR_FRAGMENT | NEXTHDR_AUTH | NEXTHDR_DEST
    )
}

/// Byte length of an extension header from its type and length field.
#[inline(always)]
pub fn extension_len(nexthdr: u8, len_field: u8) -> usize {
    match nexthdr {
        NEXTHDR_FRAGMENT => FRAG_HDR_LEN,
        // AH length counts 4-byte units, minus 2
        NEXTHDR_AUTH => (usize::from(len_field) + 2) * 4,
        // 8-byte units, not counting the first 8
        _ => (usize::from(len_field) + 1) * 8,
    }
}

/// Walk the extension chain of the IPv6 packet at `offset`.
///
/// At most [`MAX_EXTENSION_HEADERS`] headers are skipped. A chain that is
/// still going after that, one that ends in "no next header", or any header
/// running past the frame end is a failure.
pub fn walk_extension_headers(frame: &[u8], offset: usize) -> Result<Transport, ParseError> {
    let mut cursor = HeaderCursor::at(frame, offset);
    let fixed = cursor.header(IPV6_HDR_LEN)?;
    let mut nexthdr = fixed[NEXT_HEADER_OFFSET];
    cursor.advance(IPV6_HDR_LEN);

    for _ in 0..MAX_EXTENSION_HEADERS {
        if nexthdr == NEXTHDR_NONE {
            return Err(ParseError::NoNextHeader);
        }
        if !is_extension_header(nexthdr) {
            break;
        }

        let prefix = cursor.header(EXT_PREFIX_LEN)?;
        let len = extension_len(nexthdr, prefix[1]);
        nexthdr = prefix[0];
        cursor.advance(len);
    }

    if nexthdr == NEXTHDR_NONE {
        return Err(ParseError::NoNextHeader);
    }
    if is_extension_header(nexthdr) {
        return Err(ParseError::ExtensionChainTooLong(MAX_EXTENSION_HEADERS));
    }

    // The last header skipped may itself end past the frame.
    cursor.ensure(0)?;

    Ok(Transport {
        protocol: nexthdr,
        offset: cursor.offset(),
    })
}

/// Locate the TCP header inside the IPv6 packet at `offset`.
pub fn tcp_offset(frame: &[u8], offset: usize) -> Result<usize, ParseError> {
    // Too small to ever carry a TCP header, skip the walk entirely.
    HeaderCursor::at(frame, offset).ensure(IPV6_HDR_LEN + TCP_MIN_HDR_LEN)?;

    let transport = walk_extension_headers(frame, offset)?;
    if transport.protocol != IPPROTO_TCP {
        return Err(ParseError::NotTcp(transport.protocol));
    }
    Ok(transport.offset)
}
