use thiserror::Error;

/// Reasons a frame could not be walked down to a TCP header.
///
/// None of these are surfaced to the caller of the classifier: every variant
/// maps to a PASS verdict. They exist so tests, replay and trace logging can
/// tell the failure paths apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("header of {needed} bytes at offset {offset} runs past frame end {end}")]
    Truncated {
        offset: usize,
        needed: usize,
        end: usize,
    },

    #[error("unsupported ethertype {0:#06x}")]
    UnsupportedEtherType(u16),

    #[error("transport protocol {0} is not TCP")]
    NotTcp(u8),

    #[error("IPv4 header length field {0} is below the 20-byte minimum")]
    BadHeaderLength(u8),

    #[error("IPv6 extension chain ends in no-next-header")]
    NoNextHeader,

    #[error("IPv6 extension chain longer than {0} headers")]
    ExtensionChainTooLong(usize),
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("syn_per_second must be > 0")]
    ZeroSynRate,

    #[error("pass_ticks must be > 0")]
    ZeroPassTicks,

    #[error("drop_ticks must be > 0")]
    ZeroDropTicks,

    #[error("cores must be between 1 and {max}, got {value}")]
    InvalidCores { value: usize, max: usize },
}
