//! Synthetic NatNet server packets for tests and benchmarks.
//!
//! Self-contained on purpose: integration tests and benches include this
//! file with `#[path]`, so it only depends on `std` and `bytes`.

#![allow(dead_code)]

use bytes::{BufMut, BytesMut};

/// Which optional fields to emit, mirroring the server's version gates.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub marker_details: bool,
    pub rigid_body_names: bool,
    pub skeletons: bool,
    pub labeled_markers: bool,
    pub tracking_flags: bool,
    pub double_timestamp: bool,
    pub force_plates: bool,
}

impl Layout {
    pub fn for_version(major: u8, minor: u8) -> Self {
        let at_least = |ma: u8, mi: u8| major == 0 || (major, minor) >= (ma, mi);
        Self {
            marker_details: at_least(2, 0),
            rigid_body_names: at_least(2, 0),
            skeletons: at_least(2, 1),
            labeled_markers: at_least(2, 3),
            tracking_flags: at_least(2, 6),
            double_timestamp: at_least(2, 7),
            force_plates: at_least(2, 9),
        }
    }

    pub fn newest() -> Self {
        Self::for_version(3, 0)
    }
}

/// Rigid body record to encode.
#[derive(Debug, Clone, Default)]
pub struct BodySpec {
    pub id: i32,
    pub position: [f32; 3],
    pub orientation: [f32; 4],
    pub markers: Vec<[f32; 3]>,
    pub valid: bool,
}

impl BodySpec {
    pub fn new(id: i32, position: [f32; 3]) -> Self {
        Self {
            id,
            position,
            orientation: [0.0, 0.0, 0.0, 1.0],
            markers: Vec::new(),
            valid: true,
        }
    }

    pub fn with_markers(mut self, count: usize) -> Self {
        self.markers = (0..count)
            .map(|i| {
                let offset = i as f32 * 0.01;
                [
                    self.position[0] + offset,
                    self.position[1],
                    self.position[2],
                ]
            })
            .collect();
        self
    }
}

/// Frame-of-data contents to encode.
#[derive(Debug, Clone, Default)]
pub struct FrameSpec {
    pub frame_number: i32,
    pub marker_sets: Vec<(String, Vec<[f32; 3]>)>,
    pub unlabeled_markers: Vec<[f32; 3]>,
    pub bodies: Vec<BodySpec>,
    pub skeletons: Vec<(i32, Vec<BodySpec>)>,
    /// (id, position, size, parameter bits)
    pub labeled_markers: Vec<(i32, [f32; 3], f32, u16)>,
    /// (id, per-channel samples)
    pub force_plates: Vec<(i32, Vec<Vec<i32>>)>,
    pub latency: f32,
    pub timecode: u32,
    pub timecode_sub: u32,
    pub timestamp: f64,
    pub flags: u16,
}

/// Rigid body description to encode.
#[derive(Debug, Clone)]
pub struct DescriptionSpec {
    pub id: i32,
    pub name: String,
    pub parent_id: i32,
    pub offset: [f32; 3],
}

impl DescriptionSpec {
    pub fn new(id: i32, name: &str, parent_id: i32) -> Self {
        Self {
            id,
            name: name.to_owned(),
            parent_id,
            offset: [0.0; 3],
        }
    }
}

/// Model definition dataset to encode.
#[derive(Debug, Clone)]
pub enum DatasetSpec {
    MarkerSet { name: String, markers: Vec<String> },
    RigidBody(DescriptionSpec),
    Skeleton {
        name: String,
        id: i32,
        bones: Vec<DescriptionSpec>,
    },
}

/// Little-endian packet writer.
#[derive(Debug, Default)]
pub struct PacketWriter {
    buf: BytesMut,
}

impl PacketWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.buf.put_u16_le(value);
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.buf.put_u32_le(value);
        self
    }

    pub fn i32(&mut self, value: i32) -> &mut Self {
        self.buf.put_i32_le(value);
        self
    }

    pub fn f32(&mut self, value: f32) -> &mut Self {
        self.buf.put_f32_le(value);
        self
    }

    pub fn f64(&mut self, value: f64) -> &mut Self {
        self.buf.put_f64_le(value);
        self
    }

    pub fn floats(&mut self, values: &[f32]) -> &mut Self {
        for value in values {
            self.buf.put_f32_le(*value);
        }
        self
    }

    pub fn cstr(&mut self, text: &str) -> &mut Self {
        self.buf.put_slice(text.as_bytes());
        self.buf.put_u8(0);
        self
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.put_slice(bytes);
        self
    }

    fn count(&mut self, count: usize) -> &mut Self {
        self.i32(i32::try_from(count).unwrap_or(i32::MAX))
    }

    pub fn rigid_body(&mut self, layout: &Layout, body: &BodySpec) -> &mut Self {
        self.i32(body.id)
            .floats(&body.position)
            .floats(&body.orientation)
            .count(body.markers.len());
        for marker in &body.markers {
            self.floats(marker);
        }
        if layout.marker_details {
            for i in 0..body.markers.len() {
                self.count(i + 1);
            }
            for _ in &body.markers {
                self.f32(0.02);
            }
            self.f32(0.001);
        }
        if layout.tracking_flags {
            self.u16(u16::from(body.valid));
        }
        self
    }

    pub fn skeleton(&mut self, layout: &Layout, id: i32, bones: &[BodySpec]) -> &mut Self {
        self.i32(id).count(bones.len());
        for bone in bones {
            self.rigid_body(layout, bone);
        }
        self
    }

    pub fn frame(&mut self, layout: &Layout, frame: &FrameSpec) -> &mut Self {
        self.i32(frame.frame_number).count(frame.marker_sets.len());
        for (name, markers) in &frame.marker_sets {
            self.cstr(name).count(markers.len());
            for marker in markers {
                self.floats(marker);
            }
        }

        self.count(frame.unlabeled_markers.len());
        for marker in &frame.unlabeled_markers {
            self.floats(marker);
        }

        self.count(frame.bodies.len());
        for body in &frame.bodies {
            self.rigid_body(layout, body);
        }

        if layout.skeletons {
            self.count(frame.skeletons.len());
            for (id, bones) in &frame.skeletons {
                self.skeleton(layout, *id, bones);
            }
        }

        if layout.labeled_markers {
            self.count(frame.labeled_markers.len());
            for (id, position, size, bits) in &frame.labeled_markers {
                self.i32(*id).floats(position).f32(*size);
                if layout.tracking_flags {
                    self.u16(*bits);
                }
            }
        }

        if layout.force_plates {
            self.count(frame.force_plates.len());
            for (id, channels) in &frame.force_plates {
                self.i32(*id).count(channels.len());
                for samples in channels {
                    self.count(samples.len());
                    for sample in samples {
                        self.i32(*sample);
                    }
                }
            }
        }

        self.f32(frame.latency)
            .u32(frame.timecode)
            .u32(frame.timecode_sub);
        if layout.double_timestamp {
            self.f64(frame.timestamp);
        } else {
            self.f32(frame.timestamp as f32);
        }
        self.u16(frame.flags)
    }

    pub fn rigid_body_description(
        &mut self,
        layout: &Layout,
        description: &DescriptionSpec,
    ) -> &mut Self {
        if layout.rigid_body_names {
            self.cstr(&description.name);
        }
        self.i32(description.id)
            .i32(description.parent_id)
            .floats(&description.offset)
    }

    pub fn skeleton_description(
        &mut self,
        layout: &Layout,
        name: &str,
        id: i32,
        bones: &[DescriptionSpec],
    ) -> &mut Self {
        self.cstr(name).i32(id).count(bones.len());
        for bone in bones {
            self.rigid_body_description(layout, bone);
        }
        self
    }

    pub fn model_definition(&mut self, layout: &Layout, datasets: &[DatasetSpec]) -> &mut Self {
        self.count(datasets.len());
        for dataset in datasets {
            match dataset {
                DatasetSpec::MarkerSet { name, markers } => {
                    self.u32(0).cstr(name).count(markers.len());
                    for marker in markers {
                        self.cstr(marker);
                    }
                }
                DatasetSpec::RigidBody(description) => {
                    self.u32(1).rigid_body_description(layout, description);
                }
                DatasetSpec::Skeleton { name, id, bones } => {
                    self.u32(2).skeleton_description(layout, name, *id, bones);
                }
            }
        }
        self
    }

    pub fn server_info(
        &mut self,
        app_name: &str,
        app_version: [u8; 4],
        natnet: [u8; 4],
    ) -> &mut Self {
        let mut name = [0u8; 256];
        let len = app_name.len().min(255);
        name[..len].copy_from_slice(&app_name.as_bytes()[..len]);
        self.raw(&name).raw(&app_version).raw(&natnet)
    }

    /// Bytes written so far, without a message header.
    pub fn into_payload(self) -> Vec<u8> {
        self.buf.to_vec()
    }

    /// Prefix the payload with a message header declaring its length.
    pub fn into_packet(self, message_type: u16) -> Vec<u8> {
        let mut packet = BytesMut::with_capacity(self.buf.len() + 4);
        packet.put_u16_le(message_type);
        packet.put_u16_le(u16::try_from(self.buf.len()).unwrap_or(u16::MAX));
        packet.put_slice(&self.buf);
        packet.to_vec()
    }
}

pub const PING_RESPONSE: u16 = 1;
pub const RESPONSE: u16 = 3;
pub const MODEL_DEF: u16 = 5;
pub const FRAME_OF_DATA: u16 = 7;
pub const MESSAGE_STRING: u16 = 8;
pub const UNRECOGNIZED_REQUEST: u16 = 100;

pub fn frame_packet(layout: &Layout, frame: &FrameSpec) -> Vec<u8> {
    let mut writer = PacketWriter::new();
    writer.frame(layout, frame);
    writer.into_packet(FRAME_OF_DATA)
}

pub fn model_definition_packet(layout: &Layout, datasets: &[DatasetSpec]) -> Vec<u8> {
    let mut writer = PacketWriter::new();
    writer.model_definition(layout, datasets);
    writer.into_packet(MODEL_DEF)
}

pub fn ping_response_packet(app_name: &str, natnet: [u8; 4]) -> Vec<u8> {
    let mut writer = PacketWriter::new();
    writer.server_info(app_name, [1, 0, 0, 0], natnet);
    writer.into_packet(PING_RESPONSE)
}

pub fn message_string_packet(text: &str) -> Vec<u8> {
    let mut writer = PacketWriter::new();
    writer.cstr(text);
    writer.into_packet(MESSAGE_STRING)
}

pub fn response_code_packet(code: i32) -> Vec<u8> {
    let mut writer = PacketWriter::new();
    writer.i32(code);
    writer.into_packet(RESPONSE)
}

pub fn response_text_packet(text: &str) -> Vec<u8> {
    let mut writer = PacketWriter::new();
    writer.cstr(text);
    writer.into_packet(RESPONSE)
}
