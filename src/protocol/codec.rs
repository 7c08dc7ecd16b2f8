//! NatNet record decoders
//!
//! Every decoder reads one record from the front of a byte slice under a
//! given [`StreamVersion`] and reports how many bytes it consumed. Counts
//! and arrays are read strictly in wire order; the format carries no other
//! length information, so a single misread field desynchronizes everything
//! after it.
//!
//! Decoders only build local values. Nothing here touches session state,
//! so a decode that fails part-way leaves no trace.

use tracing::trace;

use super::cursor::Cursor;
use super::model::{
    DataDescription, ForcePlate, FrameOfData, LabeledMarker, Marker, MarkerSet,
    MarkerSetDescription, ModelDefinition, RigidBody, RigidBodyDescription, ServerInfo, Skeleton,
    SkeletonDescription,
};
use super::{
    DatasetType, Features, FrameFlags, MarkerFlags, Malformed, Result, SERVER_NAME_SIZE,
    StreamVersion,
};

// Smallest wire size of each repeated element, used to reject counts that
// no datagram could hold.
const VEC3_SIZE: usize = 12;
const RIGID_BODY_MIN_SIZE: usize = 4 + 12 + 16 + 4;
const SKELETON_MIN_SIZE: usize = 8;
const LABELED_MARKER_MIN_SIZE: usize = 20;
const FORCE_PLATE_MIN_SIZE: usize = 8;
const MARKER_SET_MIN_SIZE: usize = 5;
const RIGID_BODY_DESCRIPTION_MIN_SIZE: usize = 20;

/// Decode one rigid-body record.
pub fn decode_rigid_body(bytes: &[u8], version: StreamVersion) -> Result<(RigidBody, usize)> {
    let mut cursor = Cursor::new(bytes);
    let body = read_rigid_body(&mut cursor, version.features())?;
    Ok((body, cursor.position()))
}

/// Decode one skeleton record.
pub fn decode_skeleton(bytes: &[u8], version: StreamVersion) -> Result<(Skeleton, usize)> {
    let mut cursor = Cursor::new(bytes);
    let skeleton = read_skeleton(&mut cursor, version.features())?;
    Ok((skeleton, cursor.position()))
}

/// Decode a frame-of-data payload (without the message header).
pub fn decode_frame(bytes: &[u8], version: StreamVersion) -> Result<(FrameOfData, usize)> {
    let mut cursor = Cursor::new(bytes);
    let frame = read_frame(&mut cursor, version.features())?;
    Ok((frame, cursor.position()))
}

/// Decode a model-definition payload (without the message header).
pub fn decode_model_definition(
    bytes: &[u8],
    version: StreamVersion,
) -> Result<(ModelDefinition, usize)> {
    let mut cursor = Cursor::new(bytes);
    let model = read_model_definition(&mut cursor, version.features())?;
    Ok((model, cursor.position()))
}

/// Decode one rigid-body description.
pub fn decode_rigid_body_description(
    bytes: &[u8],
    version: StreamVersion,
) -> Result<(RigidBodyDescription, usize)> {
    let mut cursor = Cursor::new(bytes);
    let description = read_rigid_body_description(&mut cursor, version.features())?;
    Ok((description, cursor.position()))
}

/// Decode one skeleton description.
pub fn decode_skeleton_description(
    bytes: &[u8],
    version: StreamVersion,
) -> Result<(SkeletonDescription, usize)> {
    let mut cursor = Cursor::new(bytes);
    let description = read_skeleton_description(&mut cursor, version.features())?;
    Ok((description, cursor.position()))
}

/// Decode a ping-response payload (without the message header).
pub fn decode_server_info(bytes: &[u8]) -> Result<(ServerInfo, usize)> {
    let mut cursor = Cursor::new(bytes);
    let info = read_server_info(&mut cursor)?;
    Ok((info, cursor.position()))
}

pub(crate) fn read_rigid_body(cursor: &mut Cursor<'_>, features: Features) -> Result<RigidBody> {
    let id = cursor.read_i32()?;
    let position = cursor.read_vec3()?;
    let orientation = cursor.read_quat()?;

    let marker_count = cursor.read_count("rigid body marker", VEC3_SIZE)?;
    let mut markers = Vec::with_capacity(marker_count.min(cursor.remaining() / VEC3_SIZE));
    for _ in 0..marker_count {
        markers.push(Marker {
            position: cursor.read_vec3()?,
            id: None,
            size: None,
        });
    }

    let mut mean_error = None;
    if features.marker_details {
        for marker in &mut markers {
            marker.id = Some(cursor.read_i32()?);
        }
        for marker in &mut markers {
            marker.size = Some(cursor.read_f32()?);
        }
        mean_error = Some(cursor.read_f32()?);
    }

    let tracking_valid = if features.tracking_flags {
        Some(cursor.read_u16()? & 0x01 != 0)
    } else {
        None
    };

    trace!(id, markers = markers.len(), "rigid body");
    Ok(RigidBody {
        id,
        position,
        orientation,
        markers,
        mean_error,
        tracking_valid,
    })
}

pub(crate) fn read_skeleton(cursor: &mut Cursor<'_>, features: Features) -> Result<Skeleton> {
    let id = cursor.read_i32()?;
    let bone_count = cursor.read_count("skeleton rigid body", RIGID_BODY_MIN_SIZE)?;
    let mut bones = Vec::with_capacity(bone_count.min(cursor.remaining() / RIGID_BODY_MIN_SIZE));
    for _ in 0..bone_count {
        bones.push(read_rigid_body(cursor, features)?);
    }
    trace!(id, bones = bones.len(), "skeleton");
    Ok(Skeleton { id, bones })
}

pub(crate) fn read_frame(cursor: &mut Cursor<'_>, features: Features) -> Result<FrameOfData> {
    let frame_number = cursor.read_i32()?;

    let marker_set_count = cursor.read_count("marker set", MARKER_SET_MIN_SIZE)?;
    let mut marker_sets =
        Vec::with_capacity(marker_set_count.min(cursor.remaining() / MARKER_SET_MIN_SIZE));
    for _ in 0..marker_set_count {
        let name = cursor.read_cstr()?;
        let markers = read_vec3_array(cursor, "marker set marker")?;
        marker_sets.push(MarkerSet { name, markers });
    }

    let unlabeled_markers = read_vec3_array(cursor, "unlabeled marker")?;

    let rigid_body_count = cursor.read_count("rigid body", RIGID_BODY_MIN_SIZE)?;
    let mut rigid_bodies =
        Vec::with_capacity(rigid_body_count.min(cursor.remaining() / RIGID_BODY_MIN_SIZE));
    for _ in 0..rigid_body_count {
        rigid_bodies.push(read_rigid_body(cursor, features)?);
    }

    let mut skeletons = Vec::new();
    if features.skeletons {
        let count = cursor.read_count("skeleton", SKELETON_MIN_SIZE)?;
        for _ in 0..count {
            skeletons.push(read_skeleton(cursor, features)?);
        }
    }

    let mut labeled_markers = Vec::new();
    if features.labeled_markers {
        let count = cursor.read_count("labeled marker", LABELED_MARKER_MIN_SIZE)?;
        labeled_markers.reserve(count.min(cursor.remaining() / LABELED_MARKER_MIN_SIZE));
        for _ in 0..count {
            let id = cursor.read_i32()?;
            let position = cursor.read_vec3()?;
            let size = cursor.read_f32()?;
            let flags = if features.tracking_flags {
                Some(MarkerFlags::from_bits(cursor.read_u16()?))
            } else {
                None
            };
            labeled_markers.push(LabeledMarker {
                id,
                position,
                size,
                flags,
            });
        }
    }

    let mut force_plates = Vec::new();
    if features.force_plates {
        let count = cursor.read_count("force plate", FORCE_PLATE_MIN_SIZE)?;
        for _ in 0..count {
            let id = cursor.read_i32()?;
            let channel_count = cursor.read_count("force plate channel", 4)?;
            let mut channels = Vec::with_capacity(channel_count.min(cursor.remaining() / 4));
            for _ in 0..channel_count {
                let sample_count = cursor.read_count("force plate sample", 4)?;
                let mut samples = Vec::with_capacity(sample_count.min(cursor.remaining() / 4));
                for _ in 0..sample_count {
                    samples.push(cursor.read_i32()?);
                }
                channels.push(samples);
            }
            force_plates.push(ForcePlate { id, channels });
        }
    }

    let latency = cursor.read_f32()?;
    let timecode = cursor.read_u32()?;
    let timecode_sub = cursor.read_u32()?;
    let timestamp = if features.double_timestamp {
        cursor.read_f64()?
    } else {
        f64::from(cursor.read_f32()?)
    };
    let flags = FrameFlags::from_bits(cursor.read_u16()?);

    trace!(
        frame_number,
        rigid_bodies = rigid_bodies.len(),
        skeletons = skeletons.len(),
        labeled_markers = labeled_markers.len(),
        "frame of data"
    );
    Ok(FrameOfData {
        frame_number,
        marker_sets,
        unlabeled_markers,
        rigid_bodies,
        skeletons,
        labeled_markers,
        force_plates,
        latency,
        timecode,
        timecode_sub,
        timestamp,
        flags,
    })
}

pub(crate) fn read_model_definition(
    cursor: &mut Cursor<'_>,
    features: Features,
) -> Result<ModelDefinition> {
    let dataset_count = cursor.read_count("dataset", 4)?;
    let mut datasets = Vec::with_capacity(dataset_count.min(cursor.remaining() / 4));
    for _ in 0..dataset_count {
        let tag = cursor.read_u32()?;
        let dataset = match DatasetType::from_u32(tag) {
            Some(DatasetType::MarkerSet) => {
                DataDescription::MarkerSet(read_marker_set_description(cursor)?)
            }
            Some(DatasetType::RigidBody) => {
                DataDescription::RigidBody(read_rigid_body_description(cursor, features)?)
            }
            Some(DatasetType::Skeleton) => {
                DataDescription::Skeleton(read_skeleton_description(cursor, features)?)
            }
            None => return Err(Malformed::UnknownDatasetType { tag }.into()),
        };
        datasets.push(dataset);
    }
    Ok(ModelDefinition { datasets })
}

pub(crate) fn read_marker_set_description(cursor: &mut Cursor<'_>) -> Result<MarkerSetDescription> {
    let name = cursor.read_cstr()?;
    let count = cursor.read_count("marker name", 1)?;
    let mut marker_names = Vec::with_capacity(count.min(cursor.remaining()));
    for _ in 0..count {
        marker_names.push(cursor.read_cstr()?);
    }
    trace!(%name, markers = marker_names.len(), "marker set description");
    Ok(MarkerSetDescription { name, marker_names })
}

pub(crate) fn read_rigid_body_description(
    cursor: &mut Cursor<'_>,
    features: Features,
) -> Result<RigidBodyDescription> {
    let name = if features.rigid_body_names {
        cursor.read_cstr()?
    } else {
        String::new()
    };
    let id = cursor.read_i32()?;
    let parent_id = cursor.read_i32()?;
    let offset = cursor.read_vec3()?;
    trace!(id, %name, parent_id, "rigid body description");
    Ok(RigidBodyDescription {
        id,
        name,
        parent_id,
        offset,
    })
}

pub(crate) fn read_skeleton_description(
    cursor: &mut Cursor<'_>,
    features: Features,
) -> Result<SkeletonDescription> {
    let name = cursor.read_cstr()?;
    let id = cursor.read_i32()?;
    let count = cursor.read_count("skeleton bone description", RIGID_BODY_DESCRIPTION_MIN_SIZE)?;
    let mut bones =
        Vec::with_capacity(count.min(cursor.remaining() / RIGID_BODY_DESCRIPTION_MIN_SIZE));
    for _ in 0..count {
        bones.push(read_rigid_body_description(cursor, features)?);
    }
    trace!(id, %name, bones = bones.len(), "skeleton description");
    Ok(SkeletonDescription { name, id, bones })
}

pub(crate) fn read_server_info(cursor: &mut Cursor<'_>) -> Result<ServerInfo> {
    let name_field = cursor.take(SERVER_NAME_SIZE)?;
    let name_len = name_field
        .iter()
        .position(|b| *b == 0)
        .unwrap_or(name_field.len());
    let app_name = String::from_utf8_lossy(&name_field[..name_len]).into_owned();
    let app_version = cursor.read_array::<4>()?;
    let natnet_version = StreamVersion::from_bytes(cursor.read_array::<4>()?);
    Ok(ServerInfo {
        app_name,
        app_version,
        natnet_version,
    })
}

fn read_vec3_array(cursor: &mut Cursor<'_>, field: &'static str) -> Result<Vec<[f32; 3]>> {
    let count = cursor.read_count(field, VEC3_SIZE)?;
    let mut out = Vec::with_capacity(count.min(cursor.remaining() / VEC3_SIZE));
    for _ in 0..count {
        out.push(cursor.read_vec3()?);
    }
    Ok(out)
}
