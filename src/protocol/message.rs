//! Outbound commands and inbound packet dispatch.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use super::codec::{read_frame, read_model_definition, read_server_info};
use super::cursor::Cursor;
use super::model::{CommandResponse, FrameOfData, ModelDefinition, ServerInfo};
use super::{Error, HEADER_SIZE, MessageHeader, MessageType, Result, StreamVersion};

/// Payload the server expects with a ping
const PING_PAYLOAD: &str = "Ping";

/// Client → server request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ask for server info (and with it the stream version)
    Ping,
    /// Text command
    Request(String),
    /// Ask for the model definition
    RequestModelDefinition,
    /// Ask for a single frame of data
    RequestFrameOfData,
}

impl Command {
    /// Message type this command is sent as
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::Ping => MessageType::Ping,
            Self::Request(_) => MessageType::Request,
            Self::RequestModelDefinition => MessageType::RequestModelDef,
            Self::RequestFrameOfData => MessageType::RequestFrameOfData,
        }
    }

    /// Encode to a datagram
    ///
    /// # Format
    ///
    /// ```text
    /// [TYPE u16][SIZE u16][PAYLOAD (text)][NUL]
    /// ```
    ///
    /// Model-definition and frame requests declare a size of zero and carry
    /// only the terminator. Text payloads declare their length plus one,
    /// so an empty request still declares 1.
    pub fn encode(&self) -> Result<Bytes> {
        let (text, packet_size) = match self {
            Self::Ping => (PING_PAYLOAD, text_size(PING_PAYLOAD)?),
            Self::Request(text) => (text.as_str(), text_size(text)?),
            Self::RequestModelDefinition | Self::RequestFrameOfData => ("", 0),
        };

        let mut bytes = BytesMut::with_capacity(HEADER_SIZE + text.len() + 1);
        bytes.put_slice(&MessageHeader::new(self.message_type(), packet_size).to_bytes());
        bytes.put_slice(text.as_bytes());
        bytes.put_u8(0);
        Ok(bytes.freeze())
    }
}

fn text_size(text: &str) -> Result<u16> {
    u16::try_from(text.len() + 1).map_err(|_| Error::CommandTooLong { len: text.len() })
}

/// A decoded server datagram
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Ping response
    ServerInfo(ServerInfo),
    /// Reply to a text request
    Response(CommandResponse),
    /// Model definition
    ModelDefinition(ModelDefinition),
    /// Mocap frame
    FrameOfData(FrameOfData),
    /// Free-form server message
    MessageString(String),
    /// The server did not understand the last request
    UnrecognizedRequest,
    /// A message type this client does not consume
    Unhandled {
        /// Raw message type
        message_type: u16,
    },
}

impl Packet {
    /// Decode a whole datagram.
    ///
    /// The header's declared size only matters for responses, where a size
    /// of four marks an integer result code. Every other payload is decoded
    /// over the full datagram.
    pub fn decode(bytes: &[u8], version: StreamVersion) -> Result<Self> {
        let header = MessageHeader::from_bytes(bytes)?;
        let mut cursor = Cursor::new(&bytes[HEADER_SIZE..]);
        let features = version.features();

        let packet = match header.message_type() {
            Some(MessageType::FrameOfData) => Self::FrameOfData(read_frame(&mut cursor, features)?),
            Some(MessageType::ModelDef) => {
                Self::ModelDefinition(read_model_definition(&mut cursor, features)?)
            }
            Some(MessageType::PingResponse) => Self::ServerInfo(read_server_info(&mut cursor)?),
            Some(MessageType::Response) => {
                if header.packet_size() == 4 {
                    Self::Response(CommandResponse::Code(cursor.read_i32()?))
                } else {
                    Self::Response(CommandResponse::Text(cursor.read_cstr()?))
                }
            }
            Some(MessageType::MessageString) => Self::MessageString(cursor.read_cstr()?),
            Some(MessageType::UnrecognizedRequest) => Self::UnrecognizedRequest,
            _ => Self::Unhandled {
                message_type: header.message_type_raw(),
            },
        };

        debug!(
            message_type = header.message_type_raw(),
            declared_size = header.packet_size(),
            consumed = cursor.position(),
            "decoded packet"
        );
        Ok(packet)
    }

    /// Message type of the decoded datagram
    #[must_use]
    pub const fn message_type(&self) -> Option<MessageType> {
        match self {
            Self::ServerInfo(_) => Some(MessageType::PingResponse),
            Self::Response(_) => Some(MessageType::Response),
            Self::ModelDefinition(_) => Some(MessageType::ModelDef),
            Self::FrameOfData(_) => Some(MessageType::FrameOfData),
            Self::MessageString(_) => Some(MessageType::MessageString),
            Self::UnrecognizedRequest => Some(MessageType::UnrecognizedRequest),
            Self::Unhandled { message_type } => MessageType::from_u16(*message_type),
        }
    }
}
