use super::{
    error::{debug_log_error, ProtoError, Result},
    io::{
        read_bool, read_byte_array, read_i64_be, read_string_bounded, read_u16_be, read_uuid,
        write_bool, write_i64_be, write_string_bounded, write_u16_be, write_uuid,
    },
    state::{HandshakeNextState, PacketState},
    types::{PacketEncode, PacketFrame, Uuid},
    varint::{read_varint, write_varint},
};

/// Handshake (C2S) packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeC2s<'a> {
    pub protocol_version: i32,
    pub server_address: &'a str,
    pub server_port: u16,
    pub next_state: HandshakeNextState,
}

/// Status request (C2S) packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRequestC2s;

/// Status ping (C2S) packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPingC2s {
    pub payload: i64,
}

/// Status response (S2C) packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusResponseS2c<'a> {
    pub json: &'a str,
}

/// Status pong (S2C) packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPongS2c {
    pub payload: i64,
}

/// Login disconnect (S2C) packet. `reason` is a JSON text component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginDisconnectS2c<'a> {
    pub reason: &'a str,
}

/// Login start (C2S) packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginStartC2s<'a> {
    pub username: &'a str,
    /// [`Uuid::NIL`] when the client's protocol version does not send one.
    pub profile_id: Uuid,
}

/// 1.19 added optional chat signing data to login start.
const LOGIN_START_SIGNATURE_PROTOCOL: i32 = 759;
/// 1.19.1 added an optional profile id after the signing data.
const LOGIN_START_OPTIONAL_UUID_PROTOCOL: i32 = 760;
/// 1.19.3 dropped the signing data.
const LOGIN_START_UNSIGNED_PROTOCOL: i32 = 761;
/// 1.20.2 made the profile id mandatory.
const LOGIN_START_UUID_PROTOCOL: i32 = 764;

/// Any serverbound packet supported by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerboundPacket<'a> {
    Handshake(HandshakeC2s<'a>),
    StatusRequest(StatusRequestC2s),
    StatusPing(StatusPingC2s),
    LoginStart(LoginStartC2s<'a>),
}

impl PacketFrame {
    pub fn decode_serverbound<'a>(
        &'a self,
        state: PacketState,
        protocol_version: i32,
    ) -> Result<ServerboundPacket<'a>> {
        ServerboundPacket::decode(state, protocol_version, self)
    }
}

impl<'a> ServerboundPacket<'a> {
    pub fn decode(
        state: PacketState,
        protocol_version: i32,
        frame: &'a PacketFrame,
    ) -> Result<Self> {
        let mut input = frame.body.as_slice();
        let unexpected = ProtoError::UnexpectedPacket {
            state,
            id: frame.id,
        };
        let packet = match state {
            PacketState::Handshaking => match frame.id {
                HandshakeC2s::ID => {
                    HandshakeC2s::decode_body(&mut input).map(ServerboundPacket::Handshake)
                }
                _ => Err(unexpected),
            },
            PacketState::Status => match frame.id {
                StatusRequestC2s::ID => {
                    StatusRequestC2s::decode_body(&mut input).map(ServerboundPacket::StatusRequest)
                }
                StatusPingC2s::ID => {
                    StatusPingC2s::decode_body(&mut input).map(ServerboundPacket::StatusPing)
                }
                _ => Err(unexpected),
            },
            PacketState::Login => match frame.id {
                LoginStartC2s::ID => {
                    LoginStartC2s::decode_body_with_version(&mut input, protocol_version)
                        .map(ServerboundPacket::LoginStart)
                }
                _ => Err(unexpected),
            },
        };

        packet.inspect_err(|err| debug_log_error("packet body decode failed", err))
    }
}

impl<'a> HandshakeC2s<'a> {
    pub const ID: i32 = 0x00;

    pub fn decode_body(input: &mut &'a [u8]) -> Result<Self> {
        let protocol_version = read_varint(input)?;
        let server_address = read_string_bounded(input, 255)?;
        let server_port = read_u16_be(input)?;
        let next_state = match read_varint(input)? {
            1 => HandshakeNextState::Status,
            2 => HandshakeNextState::Login,
            other => return Err(ProtoError::InvalidState(other)),
        };

        Ok(Self {
            protocol_version,
            server_address,
            server_port,
            next_state,
        })
    }
}

impl PacketEncode for HandshakeC2s<'_> {
    const ID: i32 = HandshakeC2s::ID;

    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()> {
        write_varint(out, self.protocol_version);
        write_string_bounded(out, self.server_address, 255)?;
        write_u16_be(out, self.server_port);
        let next = match self.next_state {
            HandshakeNextState::Status => 1,
            HandshakeNextState::Login => 2,
        };
        write_varint(out, next);
        Ok(())
    }
}

impl StatusRequestC2s {
    pub const ID: i32 = 0x00;

    pub fn decode_body(_input: &mut &[u8]) -> Result<Self> {
        Ok(Self)
    }
}

impl PacketEncode for StatusRequestC2s {
    const ID: i32 = StatusRequestC2s::ID;

    fn encode_body(&self, _out: &mut Vec<u8>) -> Result<()> {
        Ok(())
    }
}

impl StatusPingC2s {
    pub const ID: i32 = 0x01;

    pub fn decode_body(input: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            payload: read_i64_be(input)?,
        })
    }
}

impl PacketEncode for StatusPingC2s {
    const ID: i32 = StatusPingC2s::ID;

    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()> {
        write_i64_be(out, self.payload);
        Ok(())
    }
}

impl<'a> StatusResponseS2c<'a> {
    pub const ID: i32 = 0x00;

    pub fn decode_body(input: &mut &'a [u8]) -> Result<Self> {
        Ok(Self {
            json: read_string_bounded(input, 32_767)?,
        })
    }
}

impl PacketEncode for StatusResponseS2c<'_> {
    const ID: i32 = StatusResponseS2c::ID;

    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()> {
        write_string_bounded(out, self.json, 32_767)
    }
}

impl StatusPongS2c {
    pub const ID: i32 = 0x01;

    pub fn decode_body(input: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            payload: read_i64_be(input)?,
        })
    }
}

impl PacketEncode for StatusPongS2c {
    const ID: i32 = StatusPongS2c::ID;

    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()> {
        write_i64_be(out, self.payload);
        Ok(())
    }
}

impl<'a> LoginDisconnectS2c<'a> {
    pub const ID: i32 = 0x00;

    pub fn decode_body(input: &mut &'a [u8]) -> Result<Self> {
        Ok(Self {
            reason: read_string_bounded(input, 262_144)?,
        })
    }
}

impl PacketEncode for LoginDisconnectS2c<'_> {
    const ID: i32 = LoginDisconnectS2c::ID;

    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()> {
        write_string_bounded(out, self.reason, 262_144)
    }
}

impl<'a> LoginStartC2s<'a> {
    pub const ID: i32 = 0x00;

    pub fn decode_body_with_version(input: &mut &'a [u8], protocol_version: i32) -> Result<Self> {
        let username = read_string_bounded(input, 16)?;
        let mut profile_id = Uuid::NIL;

        if input.is_empty() || protocol_version < LOGIN_START_SIGNATURE_PROTOCOL {
            *input = &[];
            return Ok(Self {
                username,
                profile_id,
            });
        }

        if protocol_version >= LOGIN_START_UUID_PROTOCOL {
            profile_id = read_uuid(input)?;
        } else {
            if protocol_version < LOGIN_START_UNSIGNED_PROTOCOL && read_bool(input)? {
                let _timestamp = read_i64_be(input)?;
                let _public_key = read_byte_array(input)?;
                let _signature = read_byte_array(input)?;
            }
            if protocol_version >= LOGIN_START_OPTIONAL_UUID_PROTOCOL && read_bool(input)? {
                profile_id = read_uuid(input)?;
            }
        }
        *input = &[];

        Ok(Self {
            username,
            profile_id,
        })
    }

    pub fn encode_body_with_version(&self, out: &mut Vec<u8>, protocol_version: i32) -> Result<()> {
        write_string_bounded(out, self.username, 16)?;
        if protocol_version >= LOGIN_START_UUID_PROTOCOL {
            write_uuid(out, &self.profile_id);
            return Ok(());
        }

        if (LOGIN_START_SIGNATURE_PROTOCOL..LOGIN_START_UNSIGNED_PROTOCOL)
            .contains(&protocol_version)
        {
            write_bool(out, false);
        }
        if protocol_version >= LOGIN_START_OPTIONAL_UUID_PROTOCOL {
            let has_uuid = !self.profile_id.is_nil();
            write_bool(out, has_uuid);
            if has_uuid {
                write_uuid(out, &self.profile_id);
            }
        }
        Ok(())
    }

    /// Bind a protocol version so the packet can go through [`PacketEncode`].
    pub fn versioned(self, protocol_version: i32) -> VersionedLoginStart<'a> {
        VersionedLoginStart {
            packet: self,
            protocol_version,
        }
    }
}

/// Login start paired with the protocol version that decides its layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionedLoginStart<'a> {
    pub packet: LoginStartC2s<'a>,
    pub protocol_version: i32,
}

impl PacketEncode for VersionedLoginStart<'_> {
    const ID: i32 = LoginStartC2s::ID;

    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()> {
        self.packet
            .encode_body_with_version(out, self.protocol_version)
    }
}
