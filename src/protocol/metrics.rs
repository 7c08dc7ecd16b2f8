use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use super::MessageType;

/// Per-client packet counters, updated from the receiver threads.
#[derive(Debug, Default)]
pub struct ClientMetrics {
    datagrams_received: AtomicU64,
    bytes_received: AtomicU64,
    frames_decoded: AtomicU64,
    model_definitions: AtomicU64,
    server_infos: AtomicU64,
    text_messages: AtomicU64,
    unhandled_messages: AtomicU64,
    decode_errors: AtomicU64,
    receive_errors: AtomicU64,
    commands_sent: AtomicU64,
    last_frame_number: AtomicI64,
}

impl ClientMetrics {
    /// Create zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a datagram pulled off a socket.
    pub fn record_datagram(&self, len: usize) {
        self.datagrams_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(len as u64, Ordering::Relaxed);
    }

    /// Record a successfully decoded and applied packet.
    pub fn record_packet(&self, message_type: Option<MessageType>) {
        let counter = match message_type {
            Some(MessageType::FrameOfData) => &self.frames_decoded,
            Some(MessageType::ModelDef) => &self.model_definitions,
            Some(MessageType::PingResponse) => &self.server_infos,
            Some(
                MessageType::Response
                | MessageType::MessageString
                | MessageType::UnrecognizedRequest,
            ) => &self.text_messages,
            _ => &self.unhandled_messages,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the number of the most recent frame.
    pub fn record_frame_number(&self, frame_number: i32) {
        self.last_frame_number
            .store(i64::from(frame_number), Ordering::Relaxed);
    }

    /// Record a datagram that failed to decode.
    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a socket receive failure (timeouts excluded).
    pub fn record_receive_error(&self) {
        self.receive_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a command datagram sent to the server.
    pub fn record_command_sent(&self) {
        self.commands_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Capture current counter values.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            datagrams_received: self.datagrams_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            frames_decoded: self.frames_decoded.load(Ordering::Relaxed),
            model_definitions: self.model_definitions.load(Ordering::Relaxed),
            server_infos: self.server_infos.load(Ordering::Relaxed),
            text_messages: self.text_messages.load(Ordering::Relaxed),
            unhandled_messages: self.unhandled_messages.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            receive_errors: self.receive_errors.load(Ordering::Relaxed),
            commands_sent: self.commands_sent.load(Ordering::Relaxed),
            last_frame_number: self.last_frame_number.load(Ordering::Relaxed),
        }
    }
}

/// Lightweight snapshot of the client counters.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricsSnapshot {
    /// Datagrams pulled off either socket
    pub datagrams_received: u64,
    /// Bytes in those datagrams
    pub bytes_received: u64,
    /// Frame-of-data packets applied
    pub frames_decoded: u64,
    /// Model definitions applied
    pub model_definitions: u64,
    /// Ping responses applied
    pub server_infos: u64,
    /// Responses, server messages and unrecognized-request replies
    pub text_messages: u64,
    /// Packets with a message type the client does not consume
    pub unhandled_messages: u64,
    /// Datagrams that failed to decode
    pub decode_errors: u64,
    /// Socket receive failures, timeouts excluded
    pub receive_errors: u64,
    /// Commands sent to the server
    pub commands_sent: u64,
    /// Number of the most recent frame, as sent by the server
    pub last_frame_number: i64,
}

impl MetricsSnapshot {
    /// Share of received datagrams that failed to decode.
    #[must_use]
    pub fn decode_error_rate(&self) -> Option<f64> {
        if self.datagrams_received == 0 {
            return None;
        }
        Some(self.decode_errors as f64 / self.datagrams_received as f64)
    }
}
