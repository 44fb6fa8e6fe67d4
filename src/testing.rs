//! Frame builders for tests, benchmarks and fuzzing.
//!
//! Builds well-formed Ethernet frames carrying IPv4 or IPv6 TCP segments, with
//! optional VLAN tags, IPv4 options and IPv6 extension headers, plus a minimal
//! legacy pcap writer for replay tests.

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::packet::ethernet::{ETH_P_IP, ETH_P_IPV6};
use crate::packet::ipv6::{extension_len, NEXTHDR_AUTH, NEXTHDR_FRAGMENT};
use crate::packet::tcp::{TCP_FLAG_SYN, TCP_MIN_HDR_LEN};
use crate::packet::IPPROTO_TCP;

/// One IPv6 extension header to place in the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionHeader {
    pub kind: u8,
    pub len_field: u8,
}

impl ExtensionHeader {
    pub fn new(kind: u8, len_field: u8) -> Self {
        Self { kind, len_field }
    }

    /// On-wire size as the walker computes it
    pub fn wire_len(&self) -> usize {
        extension_len(self.kind, self.len_field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Network {
    Ipv4,
    Ipv6,
    Other(u16),
}

/// Ethernet frame builder
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    network: Network,
    vlans: Vec<(u16, u16)>,
    protocol: u8,
    tcp_flags: u8,
    ipv4_option_words: u8,
    extensions: Vec<ExtensionHeader>,
    src_v4: Ipv4Addr,
    dst_v4: Ipv4Addr,
    src_v6: Ipv6Addr,
    dst_v6: Ipv6Addr,
    truncate: Option<usize>,
}

impl PacketBuilder {
    fn with_network(network: Network) -> Self {
        Self {
            network,
            vlans: Vec::new(),
            protocol: IPPROTO_TCP,
            tcp_flags: TCP_FLAG_SYN,
            ipv4_option_words: 0,
            extensions: Vec::new(),
            src_v4: Ipv4Addr::new(192, 168, 1, 100),
            dst_v4: Ipv4Addr::new(192, 168, 1, 1),
            src_v6: Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 0x100),
            dst_v6: Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1),
            truncate: None,
        }
    }

    /// IPv4 TCP SYN
    pub fn ipv4() -> Self {
        Self::with_network(Network::Ipv4)
    }

    /// IPv6 TCP SYN
    pub fn ipv6() -> Self {
        Self::with_network(Network::Ipv6)
    }

    /// Frame with an arbitrary ethertype and a small zeroed payload
    pub fn ethertype(ethertype: u16) -> Self {
        Self::with_network(Network::Other(ethertype))
    }

    /// Push a VLAN tag; the first call is the outermost tag.
    pub fn with_vlan(mut self, tpid: u16, vid: u16) -> Self {
        self.vlans.push((tpid, vid & 0x0fff));
        self
    }

    pub fn with_protocol(mut self, protocol: u8) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_tcp_flags(mut self, flags: u8) -> Self {
        self.tcp_flags = flags;
        self
    }

    /// IPv4 options, in 4-byte words (max 10)
    pub fn with_ipv4_options(mut self, words: u8) -> Self {
        self.ipv4_option_words = words.min(10);
        self
    }

    pub fn with_extension(mut self, ext: ExtensionHeader) -> Self {
        self.extensions.push(ext);
        self
    }

    pub fn with_src_v4(mut self, ip: Ipv4Addr) -> Self {
        self.src_v4 = ip;
        self
    }

    pub fn with_src_v6(mut self, ip: Ipv6Addr) -> Self {
        self.src_v6 = ip;
        self
    }

    /// Cut the finished frame to `len` bytes
    pub fn truncated(mut self, len: usize) -> Self {
        self.truncate = Some(len);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let (ethertype, payload) = match self.network {
            Network::Ipv4 => (ETH_P_IP, self.build_ipv4()),
            Network::Ipv6 => (ETH_P_IPV6, self.build_ipv6()),
            Network::Other(ethertype) => (ethertype, vec![0u8; 28]),
        };

        let mut frame = Vec::with_capacity(14 + 4 * self.vlans.len() + payload.len());
        frame.extend_from_slice(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
        frame.extend_from_slice(&[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);

        // Each TPID sits where the previous header's protocol field is.
        for (tpid, _) in &self.vlans {
            frame.extend_from_slice(&tpid.to_be_bytes());
            frame.extend_from_slice(&[0, 0]); // TCI placeholder
        }
        frame.extend_from_slice(&ethertype.to_be_bytes());

        // Fill in TCIs now that the layout is fixed
        for (i, (_, vid)) in self.vlans.iter().enumerate() {
            let tci_at = 14 + 4 * i;
            frame[tci_at..tci_at + 2].copy_from_slice(&vid.to_be_bytes());
        }

        frame.extend_from_slice(&payload);

        if let Some(len) = self.truncate {
            frame.truncate(len);
        }
        frame
    }

    fn transport(&self) -> Vec<u8> {
        let mut tcp = vec![0u8; TCP_MIN_HDR_LEN];
        if self.protocol == IPPROTO_TCP {
            tcp[0..2].copy_from_slice(&40_000u16.to_be_bytes());
            tcp[2..4].copy_from_slice(&443u16.to_be_bytes());
            tcp[4..8].copy_from_slice(&0x1234_5678u32.to_be_bytes());
            tcp[12] = 5 << 4;
            tcp[13] = self.tcp_flags;
            tcp[14..16].copy_from_slice(&64_240u16.to_be_bytes());
        }
        tcp
    }

    fn build_ipv4(&self) -> Vec<u8> {
        let header_len = 20 + 4 * usize::from(self.ipv4_option_words);
        let transport = self.transport();
        let total_len = (header_len + transport.len()) as u16;

        let mut ip = vec![0u8; header_len];
        ip[0] = 0x40 | (header_len / 4) as u8;
        ip[2..4].copy_from_slice(&total_len.to_be_bytes());
        ip[8] = 64;
        ip[9] = self.protocol;
        ip[12..16].copy_from_slice(&self.src_v4.octets());
        ip[16..20].copy_from_slice(&self.dst_v4.octets());
        // NOP options
        for byte in ip.iter_mut().skip(20) {
            *byte = 1;
        }

        ip.extend_from_slice(&transport);
        ip
    }

    fn build_ipv6(&self) -> Vec<u8> {
        let mut chain = Vec::new();
        for (i, ext) in self.extensions.iter().enumerate() {
            let next = self
                .extensions
                .get(i + 1)
                .map(|e| e.kind)
                .unwrap_or(self.protocol);
            let mut header = vec![0u8; ext.wire_len()];
            header[0] = next;
            // Fragment headers have a reserved byte where others carry a length
            if ext.kind != NEXTHDR_FRAGMENT {
                header[1] = ext.len_field;
            }
            if ext.kind == NEXTHDR_AUTH {
                header[4..8].copy_from_slice(&0x100u32.to_be_bytes()); // SPI
            }
            chain.extend_from_slice(&header);
        }

        let transport = self.transport();
        let payload_len = (chain.len() + transport.len()) as u16;
        let first = self
            .extensions
            .first()
            .map(|e| e.kind)
            .unwrap_or(self.protocol);

        let mut ip = vec![0u8; 40];
        ip[0] = 0x60;
        ip[4..6].copy_from_slice(&payload_len.to_be_bytes());
        ip[6] = first;
        ip[7] = 64;
        ip[8..24].copy_from_slice(&self.src_v6.octets());
        ip[24..40].copy_from_slice(&self.dst_v6.octets());

        ip.extend_from_slice(&chain);
        ip.extend_from_slice(&transport);
        ip
    }
}

/// Serialize frames as a legacy (microsecond, little-endian) pcap file with
/// Ethernet link type. Each entry is `(ts_sec, frame)`.
pub fn write_pcap(frames: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0xa1b2_c3d4u32.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&65_535u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());

    for (ts_sec, data) in frames {
        let len = data.len() as u32;
        out.extend_from_slice(&ts_sec.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(data);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::ipv6::NEXTHDR_HOP;

    #[test]
    fn test_ipv4_frame_layout() {
        let frame = PacketBuilder::ipv4().build();
        assert_eq!(frame.len(), 14 + 20 + 20);
        assert_eq!(&frame[12..14], &ETH_P_IP.to_be_bytes());
        assert_eq!(frame[14], 0x45);
        assert_eq!(frame[14 + 20 + 13], TCP_FLAG_SYN);
    }

    #[test]
    fn test_vlan_layout() {
        let frame = PacketBuilder::ipv6()
            .with_vlan(0x88A8, 5)
            .with_vlan(0x8100, 6)
            .build();
        assert_eq!(&frame[12..14], &[0x88, 0xA8]);
        assert_eq!(&frame[14..16], &[0x00, 0x05]);
        assert_eq!(&frame[16..18], &[0x81, 0x00]);
        assert_eq!(&frame[18..20], &[0x00, 0x06]);
        assert_eq!(&frame[20..22], &ETH_P_IPV6.to_be_bytes());
    }

    #[test]
    fn test_ipv6_chain_links() {
        let frame = PacketBuilder::ipv6()
            .with_extension(ExtensionHeader::new(NEXTHDR_HOP, 1))
            .build();
        assert_eq!(frame[14 + 6], NEXTHDR_HOP);
        assert_eq!(frame[14 + 40], IPPROTO_TCP);
        assert_eq!(frame[14 + 41], 1);
        assert_eq!(frame.len(), 14 + 40 + 16 + 20);
    }

    #[test]
    fn test_pcap_header_size() {
        let pcap = write_pcap(&[(1, vec![0u8; 10])]);
        assert_eq!(pcap.len(), 24 + 16 + 10);
    }
}
