//! NatNet client - receive motion-capture streams from an `OptiTrack` server
//!
//! The server publishes frame data over UDP (multicast by default) and
//! answers commands on a separate port. This crate decodes the binary
//! packets for every stream version from 1.x through 3.x, keeps the latest
//! pose of each rigid body, and exposes that state to other threads.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use natnet::{ClientConfig, NatNetClient};
//!
//! let mut client = NatNetClient::new(ClientConfig::default());
//! client.start()?;
//!
//! // Descriptions and states can only change while no guard is held.
//! let session = client.lock();
//! for description in session.rigid_body_descriptions() {
//!     if let Some(body) = session.rigid_body(description.id) {
//!         println!("{}: {:?}", description.name, body.position);
//!     }
//! }
//! # Ok::<(), natnet::Error>(())
//! ```
//!
//! Packets can also be decoded without any socket:
//!
//! ```rust
//! use natnet::{Packet, StreamVersion};
//!
//! let packet = Packet::decode(&[100, 0, 0, 0], StreamVersion::DEFAULT)?;
//! assert_eq!(packet, Packet::UnrecognizedRequest);
//! # Ok::<(), natnet::Error>(())
//! ```
//!
//! # Features
//!
//! - **Version-aware decoding** - optional fields gated on the negotiated stream version
//! - **Atomic commits** - a malformed datagram never leaves partial state behind
//! - **Listeners** - per-frame and per-rigid-body callbacks on the receiver threads
//! - **`serde`** - optional serialization of decoded records and snapshots

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

use std::net::Ipv4Addr;

pub mod client;
pub mod listener;
pub mod protocol;
pub mod session;
pub mod transport;

#[cfg(test)]
mod test_utils;

pub use client::{ClientConfig, ConnectionType, NatNetClient, SessionGuard};
pub use listener::{ListenerSet, StreamListener};
pub use protocol::{
    Command, CommandResponse, Error, FrameMetadata, FrameOfData, MessageType, ModelDefinition,
    Packet, Result, RigidBody, RigidBodyDescription, ServerInfo, StreamVersion,
};
pub use session::{Session, SessionSnapshot};
pub use transport::TransportError;

/// Default server command port
pub const DEFAULT_COMMAND_PORT: u16 = 1510;

/// Default data port
pub const DEFAULT_DATA_PORT: u16 = 1511;

/// Default multicast group for frame data
pub const DEFAULT_MULTICAST_ADDRESS: Ipv4Addr = Ipv4Addr::new(239, 255, 42, 99);
