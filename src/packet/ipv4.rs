use super::cursor::HeaderCursor;
use super::IPPROTO_TCP;
use crate::error::ParseError;

/// Minimum IPv4 header length (no options)
pub const IPV4_MIN_HDR_LEN: usize = 20;

const PROTOCOL_OFFSET: usize = 9;

/// Locate the TCP header inside the IPv4 packet at `offset`.
///
/// Options are skipped using the IHL field, so the returned offset points at
/// the first byte after the full IPv4 header.
pub fn tcp_offset(frame: &[u8], offset: usize) -> Result<usize, ParseError> {
    let ip = HeaderCursor::at(frame, offset).header(IPV4_MIN_HDR_LEN)?;

    let protocol = ip[PROTOCOL_OFFSET];
    if protocol != IPPROTO_TCP {
        return Err(ParseError::NotTcp(protocol));
    }

    let ihl = ip[0] & 0x0f;
    let header_len = usize::from(ihl) * 4;
    if header_len < IPV4_MIN_HDR_LEN {
        return Err(ParseError::BadHeaderLength(ihl));
    }

    Ok(offset + header_len)
}
