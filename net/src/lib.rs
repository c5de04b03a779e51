//! Minimal Minecraft protocol types for handshake, status, login start and the legacy ping.
pub mod proto;

pub use proto::{
    decode_legacy_ping, encode_packet, encode_raw_packet, protocol_for_version, resolve_protocol, HandshakeC2s,
    HandshakeNextState, LegacyKickS2c, LegacyPingKind, LegacyServerListPing, LoginDisconnectS2c,
    LoginStartC2s, Packet, PacketDecoder, PacketEncode, PacketEncoder, PacketFrame,
    PacketState, ProtoError, ServerboundPacket, StatusPingC2s, StatusPongS2c, StatusRequestC2s,
    StatusResponseS2c, Uuid, VersionedLoginStart, DEFAULT_PROTOCOL, LEGACY_PING_MARKER,
    MAX_PACKET_SIZE,
};
