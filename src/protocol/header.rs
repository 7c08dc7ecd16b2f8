//! NatNet message header
//!
//! Every datagram starts with a 4-byte header.

use super::{Error, HEADER_SIZE, MessageType, Result};

/// NatNet message header (4 bytes)
///
/// # Wire Format
///
/// ```text
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |       Message Type (LE)       |    Declared Packet Size (LE)  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         Payload ...                           |
/// ```
///
/// The declared size is informational; decoding always runs over the whole
/// datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    message_type: u16,
    packet_size: u16,
}

impl MessageHeader {
    /// Create a new message header
    #[must_use]
    pub const fn new(message_type: MessageType, packet_size: u16) -> Self {
        Self {
            message_type: message_type.as_u16(),
            packet_size,
        }
    }

    /// Raw message type value
    #[must_use]
    pub const fn message_type_raw(&self) -> u16 {
        self.message_type
    }

    /// Get message type, `None` if the value is not a known type
    #[must_use]
    pub const fn message_type(&self) -> Option<MessageType> {
        MessageType::from_u16(self.message_type)
    }

    /// Payload size declared by the sender
    #[must_use]
    pub const fn packet_size(&self) -> u16 {
        self.packet_size
    }

    /// Convert to bytes (little-endian)
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..2].copy_from_slice(&self.message_type.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.packet_size.to_le_bytes());
        bytes
    }

    /// Parse from the start of a datagram (little-endian)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::OutOfBounds {
                offset: 0,
                requested: HEADER_SIZE,
                len: bytes.len(),
            });
        }

        Ok(Self {
            message_type: u16::from_le_bytes([bytes[0], bytes[1]]),
            packet_size: u16::from_le_bytes([bytes[2], bytes[3]]),
        })
    }
}
