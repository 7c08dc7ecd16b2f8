//! UDP transport: socket setup and the per-channel receive loops.

mod error;
mod receiver;
mod socket;

pub use error::TransportError;
pub use receiver::Channel;
pub(crate) use receiver::Receiver;
pub use socket::SocketBinding;
