use super::cursor::{be16, HeaderCursor};
use crate::error::ParseError;

pub const ETH_HDR_LEN: usize = 14;
pub const VLAN_HDR_LEN: usize = 4;

pub const ETH_P_IP: u16 = 0x0800;
pub const ETH_P_IPV6: u16 = 0x86DD;
pub const ETH_P_8021Q: u16 = 0x8100;
pub const ETH_P_8021AD: u16 = 0x88A8;

/// Stacked VLAN tags unwrapped per frame (802.1ad outer + 802.1Q inner).
pub const MAX_VLAN_DEPTH: usize = 2;

/// Network layer found behind the link header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkProtocol {
    Ipv4,
    Ipv6,
}

/// Result of the link-layer walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkLayer {
    pub protocol: NetworkProtocol,
    /// Offset of the network header within the frame
    pub offset: usize,
    pub vlan_tags: u8,
}

#[inline(always)]
fn is_vlan(proto: u16) -> bool {
    proto == ETH_P_8021Q || proto == ETH_P_8021AD
}

/// Walk the Ethernet header and up to [`MAX_VLAN_DEPTH`] VLAN tags.
///
/// The tag loop always runs exactly `MAX_VLAN_DEPTH` times; a third stacked
/// tag is left in place and its TPID is reported as an unsupported ethertype.
pub fn parse_link_layer(frame: &[u8]) -> Result<LinkLayer, ParseError> {
    let mut cursor = HeaderCursor::new(frame);
    let eth = cursor.header(ETH_HDR_LEN)?;
    let mut proto = be16(eth, 12);
    cursor.advance(ETH_HDR_LEN);

    let mut vlan_tags = 0u8;
    for _ in 0..MAX_VLAN_DEPTH {
        if is_vlan(proto) {
            let tag = cursor.header(VLAN_HDR_LEN)?;
            // TCI at 0..2, encapsulated protocol at 2..4
            proto = be16(tag, 2);
            cursor.advance(VLAN_HDR_LEN);
            vlan_tags += 1;
        }
    }

    let protocol = match proto {
        ETH_P_IP => NetworkProtocol::Ipv4,
        ETH_P_IPV6 => NetworkProtocol::Ipv6,
        other => return Err(ParseError::UnsupportedEtherType(other)),
    };

    Ok(LinkLayer {
        protocol,
        offset: cursor.offset(),
        vlan_tags,
    })
}
