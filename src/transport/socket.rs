//! UDP socket bindings for the NatNet data and command channels.

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{info, instrument};

use super::TransportError;

/// Binding for a UDP socket, shareable between a receiver thread and senders.
#[derive(Debug, Clone)]
pub struct SocketBinding {
    socket: Arc<UdpSocket>,
}

impl SocketBinding {
    /// Bind the data channel.
    ///
    /// With a multicast group the socket binds the wildcard address with
    /// address reuse and joins the group on `interface`; without one it
    /// binds `interface` directly for unicast streaming.
    #[instrument(level = "info")]
    pub fn bind_data(
        interface: Ipv4Addr,
        port: u16,
        multicast_group: Option<Ipv4Addr>,
    ) -> Result<Self, TransportError> {
        let socket = new_udp_socket()?;
        socket
            .set_reuse_address(true)
            .map_err(|source| TransportError::SocketOption {
                option: "SO_REUSEADDR",
                source,
            })?;

        let bind_ip = if multicast_group.is_some() {
            Ipv4Addr::UNSPECIFIED
        } else {
            interface
        };
        let addr = SocketAddr::from((bind_ip, port));
        socket
            .bind(&addr.into())
            .map_err(|source| TransportError::Bind { addr, source })?;

        if let Some(group) = multicast_group {
            socket
                .join_multicast_v4(&group, &interface)
                .map_err(|source| TransportError::JoinMulticast {
                    group,
                    interface,
                    source,
                })?;
        }

        let binding = Self::from_socket(socket);
        info!(local = ?binding.local_addr().ok(), ?multicast_group, "data socket bound");
        Ok(binding)
    }

    /// Bind the command channel on an ephemeral port with broadcast enabled.
    #[instrument(level = "info")]
    pub fn bind_command(interface: Ipv4Addr) -> Result<Self, TransportError> {
        let socket = new_udp_socket()?;
        socket
            .set_reuse_address(true)
            .map_err(|source| TransportError::SocketOption {
                option: "SO_REUSEADDR",
                source,
            })?;

        let addr = SocketAddr::from((interface, 0));
        socket
            .bind(&addr.into())
            .map_err(|source| TransportError::Bind { addr, source })?;
        socket
            .set_broadcast(true)
            .map_err(|source| TransportError::SocketOption {
                option: "SO_BROADCAST",
                source,
            })?;

        let binding = Self::from_socket(socket);
        info!(local = ?binding.local_addr().ok(), "command socket bound");
        Ok(binding)
    }

    fn from_socket(socket: Socket) -> Self {
        Self {
            socket: Arc::new(socket.into()),
        }
    }

    /// Set socket read timeout.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), TransportError> {
        self.socket
            .set_read_timeout(timeout)
            .map_err(|source| TransportError::SocketOption {
                option: "SO_RCVTIMEO",
                source,
            })
    }

    /// Send bytes to a remote address.
    pub fn send_to(&self, buf: &[u8], addr: SocketAddr) -> Result<usize, TransportError> {
        self.socket
            .send_to(buf, addr)
            .map_err(|source| TransportError::Send { addr, source })
    }

    /// Receive bytes into the provided buffer.
    pub fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), TransportError> {
        self.socket.recv_from(buf).map_err(TransportError::Receive)
    }

    /// Access the local address for this binding.
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.socket.local_addr().map_err(TransportError::Receive)
    }
}

fn new_udp_socket() -> Result<Socket, TransportError> {
    Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(TransportError::Create)
}
