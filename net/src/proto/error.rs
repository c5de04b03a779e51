use super::state::PacketState;

/// Protocol decode/encode error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtoError {
    /// The input ended in the middle of a length, id or field.
    #[error("truncated input")]
    TruncatedInput,
    #[error("varint exceeds 5 bytes")]
    MalformedVarInt,
    #[error("unexpected packet {id:#04x} in {state:?} state")]
    UnexpectedPacket { state: PacketState, id: i32 },
    #[error("invalid handshake next state {0}")]
    InvalidState(i32),
    #[error("packet too large ({len} bytes)")]
    PacketTooLarge { len: usize },
    #[error("negative length {0}")]
    NegativeLength(i32),
    #[error("invalid bool byte {0:#04x}")]
    InvalidBool(u8),
    #[error("invalid utf-8")]
    InvalidUtf8,
    #[error("string too long ({actual} > {max} chars)")]
    StringTooLong { max: usize, actual: usize },
    #[error("length too large ({actual} > {max} bytes)")]
    LengthTooLarge { max: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, ProtoError>;

pub(crate) fn debug_log_error(context: &str, error: &ProtoError) {
    #[cfg(debug_assertions)]
    {
        log::debug!("{}: {:?}", context, error);
    }
    let _ = context;
    let _ = error;
}
