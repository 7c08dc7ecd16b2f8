//! Decoded NatNet records.

use super::{FrameFlags, MarkerFlags, StreamVersion};

/// Position in meters (x, y, z)
pub type Vec3 = [f32; 3];

/// Orientation quaternion (x, y, z, w), not necessarily normalized
pub type Quat = [f32; 4];

/// Parent id used by root rigid bodies
pub const NO_PARENT: i32 = -1;

/// One marker belonging to a rigid body
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Marker {
    /// Marker position
    pub position: Vec3,
    /// Marker id (stream version 2.0+)
    pub id: Option<i32>,
    /// Marker size (stream version 2.0+)
    pub size: Option<f32>,
}

/// Pose and marker data of one rigid body in one frame
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RigidBody {
    /// Rigid body id
    pub id: i32,
    /// Position
    pub position: Vec3,
    /// Orientation
    pub orientation: Quat,
    /// Markers in wire order
    pub markers: Vec<Marker>,
    /// Mean marker error (stream version 2.0+)
    pub mean_error: Option<f32>,
    /// Tracking valid bit (stream version 2.6+)
    pub tracking_valid: Option<bool>,
}

impl RigidBody {
    /// Empty state for a rigid body that has been described but not yet seen.
    #[must_use]
    pub fn new(id: i32) -> Self {
        Self {
            id,
            orientation: [0.0, 0.0, 0.0, 1.0],
            ..Self::default()
        }
    }

    /// Overwrite every field from a freshly decoded record, keeping this
    /// value's identity and marker allocation.
    pub fn update_from(&mut self, other: &Self) {
        self.id = other.id;
        self.position = other.position;
        self.orientation = other.orientation;
        self.markers.clone_from(&other.markers);
        self.mean_error = other.mean_error;
        self.tracking_valid = other.tracking_valid;
    }
}

/// Skeleton pose: an id and its bones
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Skeleton {
    /// Skeleton id
    pub id: i32,
    /// Bone poses, in wire order
    pub bones: Vec<RigidBody>,
}

/// Named marker set in a frame
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkerSet {
    /// Model name
    pub name: String,
    /// Marker positions
    pub markers: Vec<Vec3>,
}

/// Labeled marker (stream version 2.3+)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LabeledMarker {
    /// Marker id
    pub id: i32,
    /// Position
    pub position: Vec3,
    /// Size
    pub size: f32,
    /// Parameter bits (stream version 2.6+)
    pub flags: Option<MarkerFlags>,
}

/// Force plate samples (stream version 2.9+)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForcePlate {
    /// Plate id
    pub id: i32,
    /// Per-channel samples for this frame
    pub channels: Vec<Vec<i32>>,
}

/// One decoded frame-of-data packet
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameOfData {
    /// Frame number
    pub frame_number: i32,
    /// Marker sets
    pub marker_sets: Vec<MarkerSet>,
    /// Unlabeled marker positions
    pub unlabeled_markers: Vec<Vec3>,
    /// Rigid bodies
    pub rigid_bodies: Vec<RigidBody>,
    /// Skeletons (stream version 2.1+)
    pub skeletons: Vec<Skeleton>,
    /// Labeled markers (stream version 2.3+)
    pub labeled_markers: Vec<LabeledMarker>,
    /// Force plates (stream version 2.9+)
    pub force_plates: Vec<ForcePlate>,
    /// Latency
    pub latency: f32,
    /// SMPTE timecode
    pub timecode: u32,
    /// Timecode subframe
    pub timecode_sub: u32,
    /// Timestamp in seconds (single precision before stream version 2.7)
    pub timestamp: f64,
    /// Trailing parameter bits
    pub flags: FrameFlags,
}

impl FrameOfData {
    /// Summary of this frame without the per-record payload.
    #[must_use]
    pub fn metadata(&self) -> FrameMetadata {
        FrameMetadata {
            frame_number: self.frame_number,
            marker_set_count: self.marker_sets.len(),
            unlabeled_marker_count: self.unlabeled_markers.len(),
            rigid_body_count: self.rigid_bodies.len(),
            skeleton_count: self.skeletons.len(),
            labeled_marker_count: self.labeled_markers.len(),
            latency: self.latency,
            timecode: self.timecode,
            timecode_sub: self.timecode_sub,
            timestamp: self.timestamp,
            is_recording: self.flags.is_recording(),
            tracked_models_changed: self.flags.tracked_models_changed(),
        }
    }

    /// Every rigid-body record in the frame, skeleton bones included.
    pub fn all_rigid_bodies(&self) -> impl Iterator<Item = &RigidBody> {
        self.rigid_bodies
            .iter()
            .chain(self.skeletons.iter().flat_map(|s| s.bones.iter()))
    }
}

/// Per-frame counters and timing
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameMetadata {
    /// Frame number
    pub frame_number: i32,
    /// Number of marker sets
    pub marker_set_count: usize,
    /// Number of unlabeled markers
    pub unlabeled_marker_count: usize,
    /// Number of rigid bodies
    pub rigid_body_count: usize,
    /// Number of skeletons
    pub skeleton_count: usize,
    /// Number of labeled markers
    pub labeled_marker_count: usize,
    /// Latency
    pub latency: f32,
    /// SMPTE timecode
    pub timecode: u32,
    /// Timecode subframe
    pub timecode_sub: u32,
    /// Timestamp in seconds
    pub timestamp: f64,
    /// Server is recording
    pub is_recording: bool,
    /// Tracked models changed since the previous frame
    pub tracked_models_changed: bool,
}

/// Static description of a rigid body
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RigidBodyDescription {
    /// Rigid body id
    pub id: i32,
    /// Name (empty before stream version 2.0)
    pub name: String,
    /// Parent id, [`NO_PARENT`] for roots
    pub parent_id: i32,
    /// Offset from the parent
    pub offset: Vec3,
}

impl RigidBodyDescription {
    /// Parent id, if this body has one.
    #[must_use]
    pub fn parent(&self) -> Option<i32> {
        (self.parent_id != NO_PARENT).then_some(self.parent_id)
    }
}

/// Static description of a skeleton
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkeletonDescription {
    /// Skeleton name
    pub name: String,
    /// Skeleton id
    pub id: i32,
    /// Bone descriptions
    pub bones: Vec<RigidBodyDescription>,
}

/// Static description of a marker set
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkerSetDescription {
    /// Marker set name
    pub name: String,
    /// Marker names
    pub marker_names: Vec<String>,
}

/// One dataset of a model definition
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataDescription {
    /// Marker set
    MarkerSet(MarkerSetDescription),
    /// Rigid body
    RigidBody(RigidBodyDescription),
    /// Skeleton
    Skeleton(SkeletonDescription),
}

/// A decoded model-definition packet
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelDefinition {
    /// Datasets in wire order
    pub datasets: Vec<DataDescription>,
}

impl ModelDefinition {
    /// Every rigid body description, skeleton bones included, in wire order.
    ///
    /// Bones are renumbered with [`skeleton_bone_id`] so their ids match the
    /// bone records of frame data and cannot collide with top-level bodies.
    pub fn rigid_body_descriptions(&self) -> impl Iterator<Item = RigidBodyDescription> + '_ {
        self.datasets.iter().flat_map(|dataset| {
            let (skeleton_id, bodies): (Option<i32>, &[RigidBodyDescription]) = match dataset {
                DataDescription::RigidBody(body) => (None, std::slice::from_ref(body)),
                DataDescription::Skeleton(skeleton) => (Some(skeleton.id), &skeleton.bones),
                DataDescription::MarkerSet(_) => (None, &[]),
            };
            bodies.iter().map(move |body| match skeleton_id {
                Some(skeleton_id) => body.in_skeleton(skeleton_id),
                None => body.clone(),
            })
        })
    }
}

/// Id a skeleton bone carries in frame data: skeleton id in the high 16
/// bits, bone id in the low 16. Ids that already use the high bits are
/// returned unchanged.
#[must_use]
pub const fn skeleton_bone_id(skeleton_id: i32, bone_id: i32) -> i32 {
    if bone_id & !0xFFFF != 0 {
        bone_id
    } else {
        (skeleton_id << 16) | bone_id
    }
}

impl RigidBodyDescription {
    /// Copy with id and parent id renumbered as bones of `skeleton_id`.
    #[must_use]
    pub fn in_skeleton(&self, skeleton_id: i32) -> Self {
        Self {
            id: skeleton_bone_id(skeleton_id, self.id),
            name: self.name.clone(),
            parent_id: self
                .parent()
                .map_or(NO_PARENT, |parent| skeleton_bone_id(skeleton_id, parent)),
            offset: self.offset,
        }
    }
}

/// Server identity from a ping response
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServerInfo {
    /// Sending application name
    pub app_name: String,
    /// Sending application version
    pub app_version: [u8; 4],
    /// Stream version the server speaks
    pub natnet_version: StreamVersion,
}

/// Reply to a text request
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandResponse {
    /// Integer result code
    Code(i32),
    /// Text reply
    Text(String),
}
