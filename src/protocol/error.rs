//! NatNet error types

use thiserror::Error;

use crate::transport::TransportError;

/// NatNet client errors
#[derive(Error, Debug)]
pub enum Error {
    /// A read would run past the end of the datagram
    #[error("read past end of packet: {requested} bytes at offset {offset} (packet is {len} bytes)")]
    OutOfBounds {
        /// Offset the read started at
        offset: usize,
        /// Number of bytes requested
        requested: usize,
        /// Total length of the slice being read
        len: usize,
    },

    /// Packet content is structurally invalid
    #[error("malformed packet: {0}")]
    MalformedPacket(#[from] Malformed),

    /// Socket or thread failure
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// `start()` called on a running client
    #[error("client already started")]
    AlreadyStarted,

    /// Operation needs the command socket but the client is not running
    #[error("client not started")]
    NotStarted,

    /// Command text does not fit the header's 16-bit size field
    #[error("command text of {len} bytes exceeds the 16-bit packet size")]
    CommandTooLong {
        /// Text length in bytes, without the terminator
        len: usize,
    },
}

/// Reasons a packet is rejected as malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Malformed {
    /// A declared element count was negative
    #[error("negative {field} count: {count}")]
    NegativeCount {
        /// Which count field
        field: &'static str,
        /// Raw value on the wire
        count: i32,
    },

    /// A declared element count cannot fit in any datagram
    #[error("{field} count {count} exceeds the maximum packet size")]
    CountTooLarge {
        /// Which count field
        field: &'static str,
        /// Raw value on the wire
        count: i32,
    },

    /// A model definition dataset carried a type tag with no decoder
    #[error("unknown dataset type tag {tag}")]
    UnknownDatasetType {
        /// Raw type tag
        tag: u32,
    },
}

impl Error {
    /// True for errors raised while decoding a datagram.
    #[must_use]
    pub const fn is_decode_error(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. } | Self::MalformedPacket(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
