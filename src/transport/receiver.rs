//! Blocking receive loop run on a dedicated thread per channel.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use super::{SocketBinding, TransportError};
use crate::client::Shared;
use crate::protocol::MAX_PACKET_SIZE;

/// Pause after a non-timeout receive failure so a dead socket cannot spin.
const ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// Which socket a receiver drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Frame-of-data stream (multicast or unicast)
    Data,
    /// Replies to commands
    Command,
}

impl Channel {
    /// Thread name for this channel.
    #[must_use]
    pub const fn thread_name(self) -> &'static str {
        match self {
            Self::Data => "natnet-data",
            Self::Command => "natnet-command",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data => write!(f, "data"),
            Self::Command => write!(f, "command"),
        }
    }
}

/// One receive loop: socket in, committed packets out.
pub(crate) struct Receiver {
    channel: Channel,
    socket: SocketBinding,
    shared: Arc<Shared>,
    is_running: Arc<AtomicBool>,
}

impl Receiver {
    pub(crate) fn new(
        channel: Channel,
        socket: SocketBinding,
        shared: Arc<Shared>,
        is_running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            channel,
            socket,
            shared,
            is_running,
        }
    }

    /// Start the loop on a named thread.
    pub(crate) fn spawn(self) -> Result<JoinHandle<()>, TransportError> {
        let name = self.channel.thread_name();
        thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || self.run())
            .map_err(|source| TransportError::Spawn { name, source })
    }

    fn run(self) {
        let mut buffer = vec![0u8; MAX_PACKET_SIZE];
        info!(channel = %self.channel, "receiver started");

        while self.is_running.load(Ordering::Acquire) {
            let len = match self.socket.recv_from(&mut buffer) {
                Ok((len, from)) => {
                    trace!(channel = %self.channel, %from, len, "datagram received");
                    len
                }
                Err(err) if err.is_timeout() => continue,
                Err(err) => {
                    if !self.is_running.load(Ordering::Acquire) {
                        break;
                    }
                    warn!(channel = %self.channel, error = %err, "receive failed");
                    self.shared.metrics.record_receive_error();
                    thread::sleep(ERROR_BACKOFF);
                    continue;
                }
            };

            if len == 0 {
                continue;
            }

            if let Err(err) = self.shared.process_datagram(&buffer[..len]) {
                warn!(channel = %self.channel, len, error = %err, "dropping datagram");
            }
        }

        debug!(channel = %self.channel, "receiver stopped");
    }
}
