use std::io::ErrorKind;

use net::ProtoError;

use crate::threat::ClientFail;

/// Anything that ends a client connection early.
#[derive(thiserror::Error, Debug)]
pub enum ConnectionError {
    #[error("Request timeout (re::rt) - {0}")]
    Client(#[from] ClientFail),
    #[error("Networking error - {0} (re:ne)")]
    Io(#[from] std::io::Error),
    #[error("Bad request (re::br) - {0}")]
    Protocol(#[from] ProtoError),
}

impl ConnectionError {
    /// The peer stopped sending before a packet was complete.
    pub fn is_truncated(&self) -> bool {
        match self {
            Self::Protocol(ProtoError::TruncatedInput) => true,
            Self::Io(err) => err.kind() == ErrorKind::UnexpectedEof,
            _ => false,
        }
    }

    pub fn is_unexpected_packet(&self) -> bool {
        matches!(self, Self::Protocol(ProtoError::UnexpectedPacket { .. }))
    }

    /// Client went away; not worth more than a debug line.
    pub fn is_hangup(&self) -> bool {
        if self.is_truncated() {
            return true;
        }
        match self {
            Self::Io(err) => matches!(
                err.kind(),
                ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}
