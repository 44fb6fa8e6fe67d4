use super::cursor::HeaderCursor;
use crate::error::ParseError;

/// Minimum TCP header length (no options)
pub const TCP_MIN_HDR_LEN: usize = 20;

pub const TCP_FLAG_FIN: u8 = 0x01;
pub const TCP_FLAG_SYN: u8 = 0x02;
pub const TCP_FLAG_RST: u8 = 0x04;
pub const TCP_FLAG_ACK: u8 = 0x10;

const FLAGS_OFFSET: usize = 13;

/// Read the flags byte of the TCP header at `offset`.
#[inline(always)]
pub fn flags(frame: &[u8], offset: usize) -> Result<u8, ParseError> {
    let tcp = HeaderCursor::at(frame, offset).header(TCP_MIN_HDR_LEN)?;
    Ok(tcp[FLAGS_OFFSET])
}

/// Whether the TCP header at `offset` carries SYN.
///
/// Only the SYN bit is tested, so SYN+ACK counts as well.
#[inline(always)]
pub fn is_syn(frame: &[u8], offset: usize) -> Result<bool, ParseError> {
    Ok(flags(frame, offset)? & TCP_FLAG_SYN != 0)
}
