//! Transport-level error types covering socket setup, I/O and receiver threads.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};

use thiserror::Error;

/// Unified error type for NatNet transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Socket could not be created.
    #[error("failed to create UDP socket: {0}")]
    Create(#[source] io::Error),
    /// Socket option could not be applied.
    #[error("failed to set {option}: {source}")]
    SocketOption {
        /// Option being set.
        option: &'static str,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// Local address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address being bound.
        addr: SocketAddr,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// Multicast group membership was refused.
    #[error("failed to join multicast group {group} on {interface}: {source}")]
    JoinMulticast {
        /// Group address.
        group: Ipv4Addr,
        /// Local interface address.
        interface: Ipv4Addr,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// Datagram could not be sent.
    #[error("failed to send to {addr}: {source}")]
    Send {
        /// Destination.
        addr: SocketAddr,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// Datagram could not be received.
    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),
    /// Receiver thread could not be started.
    #[error("failed to spawn receiver thread {name}: {source}")]
    Spawn {
        /// Thread name.
        name: &'static str,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    /// True when a receive returned only because the read timeout elapsed.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Receive(err)
                if matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
        )
    }
}
