//! Minimal Minecraft protocol framing for handshake, status, and login start.

mod error;
mod io;
mod legacy;
mod packets;
mod state;
mod types;
mod varint;
mod version;


pub use error::{ProtoError, Result};
pub use legacy::{
    decode_legacy_ping, LegacyKickS2c, LegacyPingKind, LegacyServerListPing, LEGACY_PING_MARKER,
};
pub use packets::{
    HandshakeC2s, LoginDisconnectS2c, LoginStartC2s, ServerboundPacket, StatusPingC2s,
    StatusPongS2c, StatusRequestC2s, StatusResponseS2c, VersionedLoginStart,
};
pub use state::{HandshakeNextState, PacketState};
pub use types::{
    encode_packet, encode_raw_packet, Packet, PacketDecoder, PacketEncode,
    PacketEncoder, PacketFrame, Uuid, MAX_PACKET_SIZE,
};
pub use varint::{read_varint, varint_len, write_varint};
pub use version::{protocol_for_version, resolve_protocol, DEFAULT_PROTOCOL};
