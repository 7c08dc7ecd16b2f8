//! Per-connection state: negotiated version, rigid body descriptions and the
//! latest pose of every rigid body seen.
//!
//! Packets are fully decoded before anything is committed, so a truncated or
//! malformed datagram leaves the session exactly as it was.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::protocol::{
    FrameMetadata, FrameOfData, ModelDefinition, Packet, Result, RigidBody,
    RigidBodyDescription, ServerInfo, StreamVersion,
};

/// Outcome of merging one decoded rigid body into the state set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upsert {
    /// Slot of the entry in [`Session::rigid_bodies`]
    pub index: usize,
    /// Whether the entry was created by this update
    pub created: bool,
}

/// Mutable state shared by the receiver threads.
#[derive(Debug, Default)]
pub struct Session {
    version: StreamVersion,
    server_info: Option<ServerInfo>,
    descriptions: Vec<RigidBodyDescription>,
    rigid_bodies: Vec<RigidBody>,
    index: HashMap<i32, usize>,
    last_frame: Option<FrameMetadata>,
}

impl Session {
    /// Empty session decoding with [`StreamVersion::DEFAULT`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream version used to decode incoming packets.
    #[must_use]
    pub fn version(&self) -> StreamVersion {
        self.version
    }

    /// Force the decode version, e.g. when the server never answers a ping.
    pub fn set_version(&mut self, version: StreamVersion) {
        self.version = version;
    }

    /// Identity of the server from its last ping response.
    #[must_use]
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    /// Descriptions from the most recent model definition, unique by id.
    #[must_use]
    pub fn rigid_body_descriptions(&self) -> &[RigidBodyDescription] {
        &self.descriptions
    }

    /// Latest known pose of every rigid body, unique by id.
    #[must_use]
    pub fn rigid_bodies(&self) -> &[RigidBody] {
        &self.rigid_bodies
    }

    /// Latest known pose of one rigid body.
    #[must_use]
    pub fn rigid_body(&self, id: i32) -> Option<&RigidBody> {
        self.index.get(&id).map(|&slot| &self.rigid_bodies[slot])
    }

    /// Description for one rigid body id.
    #[must_use]
    pub fn rigid_body_description(&self, id: i32) -> Option<&RigidBodyDescription> {
        self.descriptions.iter().find(|d| d.id == id)
    }

    /// Counters of the most recently applied frame.
    #[must_use]
    pub fn last_frame(&self) -> Option<&FrameMetadata> {
        self.last_frame.as_ref()
    }

    /// Decode one datagram with the current version and commit it.
    pub fn ingest(&mut self, bytes: &[u8]) -> Result<Packet> {
        let packet = Packet::decode(bytes, self.version)?;
        self.apply(&packet);
        Ok(packet)
    }

    /// Commit an already decoded packet.
    pub fn apply(&mut self, packet: &Packet) {
        match packet {
            Packet::ServerInfo(info) => self.apply_server_info(info),
            Packet::ModelDefinition(model) => self.apply_model_definition(model),
            Packet::FrameOfData(frame) => self.apply_frame(frame),
            Packet::Response(_)
            | Packet::MessageString(_)
            | Packet::UnrecognizedRequest
            | Packet::Unhandled { .. } => {}
        }
    }

    fn apply_server_info(&mut self, info: &ServerInfo) {
        if self.version != info.natnet_version {
            info!(
                server = %info.app_name,
                from = %self.version,
                to = %info.natnet_version,
                "stream version negotiated"
            );
        }
        self.version = info.natnet_version;
        self.server_info = Some(info.clone());
    }

    fn apply_model_definition(&mut self, model: &ModelDefinition) {
        self.replace_descriptions(model.rigid_body_descriptions());
    }

    /// Swap in a new description set.
    ///
    /// All state entries are dropped first. Descriptions are deduplicated by
    /// id, a later duplicate overwriting the earlier one in place, and each
    /// described id gets an empty state entry.
    pub fn replace_descriptions<I>(&mut self, descriptions: I)
    where
        I: IntoIterator<Item = RigidBodyDescription>,
    {
        self.descriptions.clear();
        self.rigid_bodies.clear();
        self.index.clear();

        let mut slots: HashMap<i32, usize> = HashMap::new();
        for description in descriptions {
            let id = description.id;
            match slots.get(&id) {
                Some(&slot) => {
                    warn!(
                        id,
                        replaced = %self.descriptions[slot].name,
                        name = %description.name,
                        "duplicate rigid body description id"
                    );
                    self.descriptions[slot] = description;
                }
                None => {
                    slots.insert(id, self.descriptions.len());
                    self.descriptions.push(description);
                }
            }
            self.ensure_state(id);
        }

        debug!(
            descriptions = self.descriptions.len(),
            "rigid body descriptions replaced"
        );
    }

    fn ensure_state(&mut self, id: i32) -> usize {
        if let Some(&slot) = self.index.get(&id) {
            return slot;
        }
        let slot = self.rigid_bodies.len();
        self.rigid_bodies.push(RigidBody::new(id));
        self.index.insert(id, slot);
        slot
    }

    /// Merge a decoded rigid body into the state set.
    ///
    /// An existing entry is updated in place and keeps its slot; an unknown
    /// id is appended.
    pub fn upsert_rigid_body(&mut self, body: &RigidBody) -> Upsert {
        if let Some(&slot) = self.index.get(&body.id) {
            self.rigid_bodies[slot].update_from(body);
            return Upsert {
                index: slot,
                created: false,
            };
        }
        let slot = self.rigid_bodies.len();
        self.rigid_bodies.push(body.clone());
        self.index.insert(body.id, slot);
        Upsert {
            index: slot,
            created: true,
        }
    }

    /// Merge every rigid body of a frame, skeleton bones included.
    pub fn apply_frame(&mut self, frame: &FrameOfData) {
        for body in frame.all_rigid_bodies() {
            let upsert = self.upsert_rigid_body(body);
            if upsert.created {
                debug!(id = body.id, "rigid body first seen in frame data");
            }
        }
        self.last_frame = Some(frame.metadata());
    }

    /// Owned copy of the observable state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: self.version,
            server_info: self.server_info.clone(),
            rigid_body_descriptions: self.descriptions.clone(),
            rigid_bodies: self.rigid_bodies.clone(),
            last_frame: self.last_frame,
        }
    }
}

/// Point-in-time copy of a [`Session`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionSnapshot {
    /// Negotiated stream version
    pub version: StreamVersion,
    /// Server identity, once a ping response arrived
    pub server_info: Option<ServerInfo>,
    /// Rigid body descriptions
    pub rigid_body_descriptions: Vec<RigidBodyDescription>,
    /// Latest rigid body poses
    pub rigid_bodies: Vec<RigidBody>,
    /// Counters of the latest frame
    pub last_frame: Option<FrameMetadata>,
}
