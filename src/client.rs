//! Client facade: configuration, lifecycle and thread-safe state access.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard, RwLock};
use tracing::{debug, error, info, instrument};

use crate::listener::{ListenerSet, StreamListener};
use crate::protocol::{
    ClientMetrics, Command, Error, MetricsSnapshot, Packet, Result, RigidBody,
    RigidBodyDescription, ServerInfo, StreamVersion,
};
use crate::session::{Session, SessionSnapshot};
use crate::transport::{Channel, Receiver, SocketBinding};
use crate::{DEFAULT_COMMAND_PORT, DEFAULT_DATA_PORT, DEFAULT_MULTICAST_ADDRESS};

/// Shortest receive timeout applied to the sockets; zero would block forever.
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// How frame data reaches the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionType {
    /// Join the multicast group on the data port
    #[default]
    Multicast,
    /// Server sends frames straight to the data port
    Unicast,
}

/// Client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientConfig {
    /// Server address commands are sent to
    pub server_address: IpAddr,
    /// Multicast group carrying frame data
    pub multicast_address: Ipv4Addr,
    /// Local interface to bind and join the group on
    pub local_interface: Ipv4Addr,
    /// Server command port
    pub command_port: u16,
    /// Local data port
    pub data_port: u16,
    /// Multicast or unicast data
    pub connection_type: ConnectionType,
    /// Socket receive timeout; bounds how long `stop()` waits
    pub read_timeout: Duration,
    /// Ping before requesting the model definition
    pub ping_on_start: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            multicast_address: DEFAULT_MULTICAST_ADDRESS,
            local_interface: Ipv4Addr::UNSPECIFIED,
            command_port: DEFAULT_COMMAND_PORT,
            data_port: DEFAULT_DATA_PORT,
            connection_type: ConnectionType::Multicast,
            read_timeout: Duration::from_millis(100),
            ping_on_start: true,
        }
    }
}

impl ClientConfig {
    /// Set the server address.
    #[must_use]
    pub fn with_server_address(mut self, address: impl Into<IpAddr>) -> Self {
        self.server_address = address.into();
        self
    }

    /// Set the multicast group.
    #[must_use]
    pub fn with_multicast_address(mut self, address: Ipv4Addr) -> Self {
        self.multicast_address = address;
        self
    }

    /// Set the local interface.
    #[must_use]
    pub fn with_local_interface(mut self, interface: Ipv4Addr) -> Self {
        self.local_interface = interface;
        self
    }

    /// Set the server command port.
    #[must_use]
    pub fn with_command_port(mut self, port: u16) -> Self {
        self.command_port = port;
        self
    }

    /// Set the local data port; 0 picks an ephemeral one.
    #[must_use]
    pub fn with_data_port(mut self, port: u16) -> Self {
        self.data_port = port;
        self
    }

    /// Set the connection type.
    #[must_use]
    pub fn with_connection_type(mut self, connection_type: ConnectionType) -> Self {
        self.connection_type = connection_type;
        self
    }

    /// Set the socket receive timeout.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Enable or disable the ping sent by `start()`.
    #[must_use]
    pub fn with_ping_on_start(mut self, enabled: bool) -> Self {
        self.ping_on_start = enabled;
        self
    }

    /// Where commands are sent.
    #[must_use]
    pub fn server_command_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server_address, self.command_port)
    }

    fn multicast_group(&self) -> Option<Ipv4Addr> {
        match self.connection_type {
            ConnectionType::Multicast => Some(self.multicast_address),
            ConnectionType::Unicast => None,
        }
    }
}

/// State shared between the facade and the receiver threads.
pub(crate) struct Shared {
    session: Mutex<Session>,
    listeners: RwLock<ListenerSet>,
    pub(crate) metrics: ClientMetrics,
}

impl Shared {
    fn new() -> Self {
        Self {
            session: Mutex::new(Session::new()),
            listeners: RwLock::new(ListenerSet::new()),
            metrics: ClientMetrics::new(),
        }
    }

    /// Decode, commit and notify under one session lock.
    pub(crate) fn process_datagram(&self, bytes: &[u8]) -> Result<Packet> {
        self.metrics.record_datagram(bytes.len());

        let mut session = self.session.lock();
        let packet = match session.ingest(bytes) {
            Ok(packet) => packet,
            Err(err) => {
                self.metrics.record_decode_error();
                return Err(err);
            }
        };

        self.metrics.record_packet(packet.message_type());
        match &packet {
            Packet::FrameOfData(frame) => self.metrics.record_frame_number(frame.frame_number),
            Packet::ModelDefinition(model) => info!(
                datasets = model.datasets.len(),
                rigid_bodies = session.rigid_body_descriptions().len(),
                "model definition applied"
            ),
            Packet::MessageString(message) => debug!(%message, "server message"),
            Packet::Response(response) => debug!(?response, "command response"),
            _ => {}
        }

        self.listeners.read().notify(&packet);
        drop(session);
        Ok(packet)
    }
}

/// Guard over the session; state cannot change while it is held.
pub type SessionGuard<'a> = MutexGuard<'a, Session>;

/// NatNet client: two receiver threads feeding one shared session.
///
/// ```rust,no_run
/// use natnet::{ClientConfig, NatNetClient};
///
/// let mut client = NatNetClient::new(ClientConfig::default());
/// client.start()?;
/// for body in client.rigid_body_states() {
///     println!("{} {:?}", body.id, body.position);
/// }
/// client.stop();
/// # Ok::<(), natnet::Error>(())
/// ```
pub struct NatNetClient {
    config: ClientConfig,
    shared: Arc<Shared>,
    is_running: Arc<AtomicBool>,
    data_socket: Option<SocketBinding>,
    command_socket: Option<SocketBinding>,
    threads: Vec<JoinHandle<()>>,
}

impl NatNetClient {
    /// Create a stopped client.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared::new()),
            is_running: Arc::new(AtomicBool::new(false)),
            data_socket: None,
            command_socket: None,
            threads: Vec::new(),
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether the receiver threads are running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    /// Bind both sockets, start the receiver threads and ask the server for
    /// its model definition (after a ping, when enabled).
    #[instrument(skip(self), fields(server = %self.config.server_command_addr()))]
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(Error::AlreadyStarted);
        }

        let timeout = Some(self.config.read_timeout.max(MIN_READ_TIMEOUT));
        let data = SocketBinding::bind_data(
            self.config.local_interface,
            self.config.data_port,
            self.config.multicast_group(),
        )?;
        data.set_read_timeout(timeout)?;
        let command = SocketBinding::bind_command(self.config.local_interface)?;
        command.set_read_timeout(timeout)?;

        self.is_running.store(true, Ordering::Release);
        for (channel, socket) in [(Channel::Data, &data), (Channel::Command, &command)] {
            let receiver = Receiver::new(
                channel,
                socket.clone(),
                Arc::clone(&self.shared),
                Arc::clone(&self.is_running),
            );
            match receiver.spawn() {
                Ok(handle) => self.threads.push(handle),
                Err(err) => {
                    self.stop();
                    return Err(err.into());
                }
            }
        }
        self.data_socket = Some(data);
        self.command_socket = Some(command);
        info!("client started");

        let requests = if self.config.ping_on_start {
            self.ping().and_then(|_| self.request_model_definition())
        } else {
            self.request_model_definition()
        };
        if let Err(err) = requests {
            self.stop();
            return Err(err);
        }
        Ok(())
    }

    /// Clear the run flag and join both receiver threads.
    ///
    /// Each thread notices the flag within one read timeout. A datagram
    /// already being decoded is committed before its thread exits.
    pub fn stop(&mut self) {
        let was_running = self.is_running.swap(false, Ordering::AcqRel);
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                error!("receiver thread panicked");
            }
        }
        self.data_socket = None;
        self.command_socket = None;
        if was_running {
            info!("client stopped");
        }
    }

    /// Encode and send a command to the server's command port.
    pub fn send_command(&self, command: &Command) -> Result<usize> {
        let socket = self.command_socket.as_ref().ok_or(Error::NotStarted)?;
        let addr = self.config.server_command_addr();
        let sent = socket.send_to(&command.encode()?, addr)?;
        self.shared.metrics.record_command_sent();
        debug!(message_type = %command.message_type(), %addr, sent, "command sent");
        Ok(sent)
    }

    /// Ask for server info and with it the stream version.
    pub fn ping(&self) -> Result<usize> {
        self.send_command(&Command::Ping)
    }

    /// Send a text request, e.g. `"StartRecording"`.
    pub fn send_request(&self, text: impl Into<String>) -> Result<usize> {
        self.send_command(&Command::Request(text.into()))
    }

    /// Ask for the model definition.
    pub fn request_model_definition(&self) -> Result<usize> {
        self.send_command(&Command::RequestModelDefinition)
    }

    /// Ask for a single frame.
    pub fn request_frame_of_data(&self) -> Result<usize> {
        self.send_command(&Command::RequestFrameOfData)
    }

    /// Register a listener. Must not be called from inside a callback.
    pub fn add_listener(&self, listener: Arc<dyn StreamListener>) {
        self.shared.listeners.write().add(listener);
    }

    /// Drop every listener. Must not be called from inside a callback.
    pub fn clear_listeners(&self) {
        self.shared.listeners.write().clear();
    }

    /// Lock the session. Receiver threads block until the guard is dropped,
    /// so several reads through one guard see a single consistent state.
    pub fn lock(&self) -> SessionGuard<'_> {
        self.shared.session.lock()
    }

    /// Version the decoders currently use.
    #[must_use]
    pub fn negotiated_version(&self) -> StreamVersion {
        self.lock().version()
    }

    /// Server identity, once a ping response arrived.
    #[must_use]
    pub fn server_info(&self) -> Option<ServerInfo> {
        self.lock().server_info().cloned()
    }

    /// Copy of the latest rigid body states.
    #[must_use]
    pub fn rigid_body_states(&self) -> Vec<RigidBody> {
        self.lock().rigid_bodies().to_vec()
    }

    /// Copy of the rigid body descriptions.
    #[must_use]
    pub fn rigid_body_descriptions(&self) -> Vec<RigidBodyDescription> {
        self.lock().rigid_body_descriptions().to_vec()
    }

    /// Consistent copy of the whole session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    /// Current counters.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    /// Feed one raw datagram through the receive path: decode, commit,
    /// notify listeners.
    pub fn ingest(&self, bytes: &[u8]) -> Result<Packet> {
        self.shared.process_datagram(bytes)
    }

    /// Local address of the command socket while running.
    #[must_use]
    pub fn command_local_addr(&self) -> Option<SocketAddr> {
        self.command_socket.as_ref()?.local_addr().ok()
    }

    /// Local address of the data socket while running.
    #[must_use]
    pub fn data_local_addr(&self) -> Option<SocketAddr> {
        self.data_socket.as_ref()?.local_addr().ok()
    }
}

impl Drop for NatNetClient {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for NatNetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatNetClient")
            .field("config", &self.config)
            .field("is_running", &self.is_running())
            .field("threads", &self.threads.len())
            .finish_non_exhaustive()
    }
}
