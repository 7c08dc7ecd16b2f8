//! NatNet message types and bitfield flags

use std::fmt;

/// NatNet message identifiers (first `u16` of every datagram)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageType {
    /// Client → server: request server info
    Ping = 0,
    /// Server → client: server info, carries the stream version
    PingResponse = 1,
    /// Client → server: text command
    Request = 2,
    /// Server → client: reply to a text command
    Response = 3,
    /// Client → server: request the model definition
    RequestModelDef = 4,
    /// Server → client: model definition
    ModelDef = 5,
    /// Client → server: request a single frame
    RequestFrameOfData = 6,
    /// Server → client: mocap frame
    FrameOfData = 7,
    /// Server → client: free-form text message
    MessageString = 8,
    /// Client → server: disconnect notice
    Disconnect = 9,
    /// Server → client: the previous request was not understood
    UnrecognizedRequest = 100,
}

impl MessageType {
    /// Convert from the wire value
    #[must_use]
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Self::Ping),
            1 => Some(Self::PingResponse),
            2 => Some(Self::Request),
            3 => Some(Self::Response),
            4 => Some(Self::RequestModelDef),
            5 => Some(Self::ModelDef),
            6 => Some(Self::RequestFrameOfData),
            7 => Some(Self::FrameOfData),
            8 => Some(Self::MessageString),
            9 => Some(Self::Disconnect),
            100 => Some(Self::UnrecognizedRequest),
            _ => None,
        }
    }

    /// Convert to the wire value
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Check if this message type is sent by clients
    #[must_use]
    pub const fn is_request(self) -> bool {
        matches!(
            self,
            Self::Ping
                | Self::Request
                | Self::RequestModelDef
                | Self::RequestFrameOfData
                | Self::Disconnect
        )
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ping => "Ping",
            Self::PingResponse => "PingResponse",
            Self::Request => "Request",
            Self::Response => "Response",
            Self::RequestModelDef => "RequestModelDef",
            Self::ModelDef => "ModelDef",
            Self::RequestFrameOfData => "RequestFrameOfData",
            Self::FrameOfData => "FrameOfData",
            Self::MessageString => "MessageString",
            Self::Disconnect => "Disconnect",
            Self::UnrecognizedRequest => "UnrecognizedRequest",
        };
        write!(f, "{name}")
    }
}

/// Dataset type tags inside a model definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DatasetType {
    /// Named marker set
    MarkerSet = 0,
    /// Rigid body description
    RigidBody = 1,
    /// Skeleton description
    Skeleton = 2,
}

impl DatasetType {
    /// Convert from the wire value
    #[must_use]
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::MarkerSet),
            1 => Some(Self::RigidBody),
            2 => Some(Self::Skeleton),
            _ => None,
        }
    }
}

/// Per-labeled-marker parameter bits (stream version 2.6+)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkerFlags(u16);

impl MarkerFlags {
    /// Marker was occluded this frame
    pub const OCCLUDED: u16 = 1 << 0;
    /// Position solved from the point cloud
    pub const POINT_CLOUD_SOLVED: u16 = 1 << 1;
    /// Position solved from the model
    pub const MODEL_SOLVED: u16 = 1 << 2;

    /// Create from the raw wire bits
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Raw bits
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Check if occluded
    #[must_use]
    pub const fn is_occluded(self) -> bool {
        self.0 & Self::OCCLUDED != 0
    }

    /// Check if solved from the point cloud
    #[must_use]
    pub const fn is_point_cloud_solved(self) -> bool {
        self.0 & Self::POINT_CLOUD_SOLVED != 0
    }

    /// Check if solved from the model
    #[must_use]
    pub const fn is_model_solved(self) -> bool {
        self.0 & Self::MODEL_SOLVED != 0
    }
}

/// Trailing frame parameter bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameFlags(u16);

impl FrameFlags {
    /// Server is recording
    pub const RECORDING: u16 = 1 << 0;
    /// The set of tracked models changed since the previous frame
    pub const TRACKED_MODELS_CHANGED: u16 = 1 << 1;

    /// Create from the raw wire bits
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Raw bits
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Check if recording
    #[must_use]
    pub const fn is_recording(self) -> bool {
        self.0 & Self::RECORDING != 0
    }

    /// Check if tracked models changed
    #[must_use]
    pub const fn tracked_models_changed(self) -> bool {
        self.0 & Self::TRACKED_MODELS_CHANGED != 0
    }
}

impl fmt::Display for FrameFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.is_recording() {
            parts.push("RECORDING");
        }
        if self.tracked_models_changed() {
            parts.push("TRACKED_MODELS_CHANGED");
        }
        if parts.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", parts.join(" | "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_roundtrip() {
        let types = [
            MessageType::PingResponse,
            MessageType::ModelDef,
            MessageType::FrameOfData,
            MessageType::UnrecognizedRequest,
        ];

        for msg_type in types {
            let decoded = MessageType::from_u16(msg_type.as_u16()).unwrap();
            assert_eq!(msg_type, decoded);
        }
        assert_eq!(MessageType::from_u16(42), None);
    }

    #[test]
    fn test_request_classification() {
        assert!(MessageType::RequestModelDef.is_request());
        assert!(!MessageType::FrameOfData.is_request());
    }

    #[test]
    fn test_flags() {
        let marker = MarkerFlags::from_bits(0b101);
        assert!(marker.is_occluded());
        assert!(!marker.is_point_cloud_solved());
        assert!(marker.is_model_solved());

        let frame = FrameFlags::from_bits(FrameFlags::TRACKED_MODELS_CHANGED);
        assert!(!frame.is_recording());
        assert!(frame.tracked_models_changed());
        assert_eq!(frame.to_string(), "TRACKED_MODELS_CHANGED");
        assert_eq!(FrameFlags::default().to_string(), "NONE");
    }
}
