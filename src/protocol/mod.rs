//! NatNet protocol core implementation
//!
//! This module provides the wire format, record types, and decoders for NatNet.

mod codec;
mod cursor;
mod error;
mod header;
mod message;
pub(crate) mod metrics;
mod model;
mod types;
mod version;

pub use codec::{
    decode_frame, decode_model_definition, decode_rigid_body, decode_rigid_body_description,
    decode_server_info, decode_skeleton, decode_skeleton_description,
};
pub use cursor::Cursor;
pub use error::{Error, Malformed, Result};
pub use header::MessageHeader;
pub use message::{Command, Packet};
pub use metrics::{ClientMetrics, MetricsSnapshot};
pub use model::{
    CommandResponse, DataDescription, ForcePlate, FrameMetadata, FrameOfData, LabeledMarker,
    Marker, MarkerSet, MarkerSetDescription, ModelDefinition, NO_PARENT, Quat, RigidBody,
    RigidBodyDescription, ServerInfo, Skeleton, SkeletonDescription, Vec3, skeleton_bone_id,
};
pub use types::{DatasetType, FrameFlags, MarkerFlags, MessageType};
pub use version::{Features, StreamVersion};

/// Header size in bytes (message type + declared size)
pub const HEADER_SIZE: usize = 4;

/// Receive buffer size; the largest datagram the protocol documents
pub const MAX_PACKET_SIZE: usize = 32 * 1024;

/// Fixed width of the application name in a ping response
pub const SERVER_NAME_SIZE: usize = 256;
