//! Bounded header walk from the Ethernet header down to TCP.
//!
//! Every layer reads through a [`HeaderCursor`], so a frame shorter than any
//! header it claims to carry ends the walk with [`ParseError::Truncated`]
//! instead of an out-of-bounds read. Loop bounds are fixed: two VLAN tags and
//! ten IPv6 extension headers.

pub mod cursor;
pub mod ethernet;
pub mod ipv4;
pub mod ipv6;
pub mod tcp;

pub use cursor::HeaderCursor;
pub use ethernet::{LinkLayer, NetworkProtocol};

use crate::error::ParseError;

pub const IPPROTO_TCP: u8 = 6;
pub const IPPROTO_UDP: u8 = 17;

/// A TCP segment located inside a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpSegment {
    pub network: NetworkProtocol,
    pub vlan_tags: u8,
    /// Offset of the TCP header within the frame
    pub offset: usize,
    pub syn: bool,
}

/// Walk `frame` down to its TCP header.
pub fn locate_tcp(frame: &[u8]) -> Result<TcpSegment, ParseError> {
    let link = ethernet::parse_link_layer(frame)?;

    let offset = match link.protocol {
        NetworkProtocol::Ipv4 => ipv4::tcp_offset(frame, link.offset)?,
        NetworkProtocol::Ipv6 => ipv6::tcp_offset(frame, link.offset)?,
    };

    let syn = tcp::is_syn(frame, offset)?;

    Ok(TcpSegment {
        network: link.protocol,
        vlan_tags: link.vlan_tags,
        offset,
        syn,
    })
}
