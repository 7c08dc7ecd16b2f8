//! Callbacks for decoded stream events.

use std::fmt;
use std::sync::Arc;

use crate::protocol::{
    CommandResponse, FrameMetadata, Packet, Quat, RigidBodyDescription, ServerInfo, Vec3,
};

/// Receives decoded stream events.
///
/// Callbacks run on a receiver thread while the session lock is held, so
/// they must return quickly and must not call back into the client's state
/// accessors. Every method defaults to doing nothing.
pub trait StreamListener: Send + Sync {
    /// Called once per frame, after its rigid bodies.
    fn on_frame(&self, _frame: &FrameMetadata) {}

    /// Called for every rigid body record in a frame, skeleton bones included.
    fn on_rigid_body(&self, _id: i32, _position: &Vec3, _orientation: &Quat) {}

    /// Called for every rigid body description in a model definition.
    fn on_rigid_body_description(&self, _description: &RigidBodyDescription) {}

    /// Called when a ping response arrives.
    fn on_server_info(&self, _info: &ServerInfo) {}

    /// Called for free-form server messages.
    fn on_message(&self, _message: &str) {}

    /// Called for replies to text requests.
    fn on_response(&self, _response: &CommandResponse) {}
}

/// Registered listeners, notified in registration order.
#[derive(Default, Clone)]
pub struct ListenerSet {
    listeners: Vec<Arc<dyn StreamListener>>,
}

impl ListenerSet {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn add(&mut self, listener: Arc<dyn StreamListener>) {
        self.listeners.push(listener);
    }

    /// Drop every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// True when no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Fan a committed packet out to every listener.
    pub fn notify(&self, packet: &Packet) {
        if self.listeners.is_empty() {
            return;
        }
        match packet {
            Packet::FrameOfData(frame) => {
                for body in frame.all_rigid_bodies() {
                    for listener in &self.listeners {
                        listener.on_rigid_body(body.id, &body.position, &body.orientation);
                    }
                }
                let metadata = frame.metadata();
                for listener in &self.listeners {
                    listener.on_frame(&metadata);
                }
            }
            Packet::ModelDefinition(model) => {
                for description in model.rigid_body_descriptions() {
                    for listener in &self.listeners {
                        listener.on_rigid_body_description(&description);
                    }
                }
            }
            Packet::ServerInfo(info) => {
                for listener in &self.listeners {
                    listener.on_server_info(info);
                }
            }
            Packet::MessageString(message) => {
                for listener in &self.listeners {
                    listener.on_message(message);
                }
            }
            Packet::Response(response) => {
                for listener in &self.listeners {
                    listener.on_response(response);
                }
            }
            Packet::UnrecognizedRequest | Packet::Unhandled { .. } => {}
        }
    }
}

impl fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
