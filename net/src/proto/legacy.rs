//! Pre-netty server list ping.
//!
//! Clients older than 1.7 open with `0xFE` instead of a length-prefixed
//! handshake and expect a single `0xFF` kick packet holding UTF-16BE text in
//! return. Three variants exist on the wire:
//!
//! * beta 1.8 to 1.3: `FE`
//! * 1.4 to 1.5: `FE 01`
//! * 1.6: `FE 01 FA`, then a `MC|PingHost` plugin message carrying the
//!   protocol version, host and port.

use super::{
    error::{ProtoError, Result},
    io::{read_i32_be, read_u16_be, read_u8, take},
};

pub const LEGACY_PING_MARKER: u8 = 0xFE;
const LEGACY_PING_PAYLOAD: u8 = 0x01;
const LEGACY_PLUGIN_MESSAGE: u8 = 0xFA;
const LEGACY_KICK: u8 = 0xFF;
const PING_HOST_CHANNEL: &str = "MC|PingHost";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyPingKind {
    /// Bare `FE`.
    Beta,
    /// `FE 01`, optionally followed by bytes that are not a ping host message.
    V1_4,
    /// `FE 01 FA` with a complete `MC|PingHost` payload.
    V1_6,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyServerListPing {
    pub kind: LegacyPingKind,
    pub protocol_version: i32,
    pub server_address: String,
    pub server_port: u16,
}

impl LegacyServerListPing {
    fn bare(kind: LegacyPingKind) -> Self {
        Self {
            kind,
            protocol_version: 0,
            server_address: String::new(),
            server_port: 0,
        }
    }
}

/// Decode a legacy ping from the start of `input`.
///
/// Returns the ping and the number of bytes it spans, or `Ok(None)` while a
/// 1.6 ping is still incomplete. With `eof` set nothing more is expected and
/// the longest recognised prefix decides the variant, so a stream opening with
/// `0xFE` always yields a ping.
pub fn decode_legacy_ping(
    input: &[u8],
    eof: bool,
) -> Result<Option<(LegacyServerListPing, usize)>> {
    match input.first() {
        Some(&LEGACY_PING_MARKER) => {}
        Some(&other) => {
            return Err(ProtoError::UnexpectedPacket {
                state: super::state::PacketState::Handshaking,
                id: other as i32,
            })
        }
        None if eof => return Err(ProtoError::TruncatedInput),
        None => return Ok(None),
    }

    match input.get(1) {
        Some(&LEGACY_PING_PAYLOAD) => {}
        Some(_) => return Ok(Some((LegacyServerListPing::bare(LegacyPingKind::Beta), 1))),
        None => {
            return Ok(eof.then(|| (LegacyServerListPing::bare(LegacyPingKind::Beta), 1)));
        }
    }

    match input.get(2) {
        Some(&LEGACY_PLUGIN_MESSAGE) => {}
        Some(_) => return Ok(Some((LegacyServerListPing::bare(LegacyPingKind::V1_4), 2))),
        None => {
            return Ok(eof.then(|| (LegacyServerListPing::bare(LegacyPingKind::V1_4), 2)));
        }
    }

    let mut rest = &input[3..];
    match read_ping_host(&mut rest) {
        Ok(Some(ping)) => Ok(Some((ping, input.len() - rest.len()))),
        Err(ProtoError::TruncatedInput) if !eof => Ok(None),
        Ok(None) | Err(_) => Ok(Some((
            LegacyServerListPing::bare(LegacyPingKind::V1_4),
            input.len(),
        ))),
    }
}

fn read_ping_host(input: &mut &[u8]) -> Result<Option<LegacyServerListPing>> {
    if read_utf16_string(input)? != PING_HOST_CHANNEL {
        return Ok(None);
    }
    let _payload_len = read_u16_be(input)?;
    let protocol_version = read_u8(input)? as i32;
    let server_address = read_utf16_string(input)?;
    let server_port = read_i32_be(input)?;

    Ok(Some(LegacyServerListPing {
        kind: LegacyPingKind::V1_6,
        protocol_version,
        server_address,
        server_port: server_port as u16,
    }))
}

/// u16 BE length in code units, then UTF-16BE text.
fn read_utf16_string(input: &mut &[u8]) -> Result<String> {
    let units = read_u16_be(input)? as usize;
    let raw = take(input, units * 2)?;
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|_| ProtoError::InvalidUtf8)
}

/// Legacy status reply, sent as a kick packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyKickS2c<'a> {
    pub kind: LegacyPingKind,
    pub protocol_version: i32,
    pub version_name: &'a str,
    pub motd: &'a str,
    pub online_players: i32,
    pub max_players: i32,
}

impl LegacyKickS2c<'_> {
    /// Text carried by the kick, before UTF-16 encoding.
    pub fn text(&self) -> String {
        match self.kind {
            LegacyPingKind::Beta => format!(
                "{}\u{a7}{}\u{a7}{}",
                self.motd.replace('\u{a7}', ""),
                self.online_players,
                self.max_players
            ),
            LegacyPingKind::V1_4 | LegacyPingKind::V1_6 => format!(
                "\u{a7}1\0{}\0{}\0{}\0{}\0{}",
                self.protocol_version,
                self.version_name,
                self.motd,
                self.online_players,
                self.max_players
            ),
        }
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let units: Vec<u16> = self.text().encode_utf16().collect();
        if units.len() > u16::MAX as usize {
            return Err(ProtoError::StringTooLong {
                max: u16::MAX as usize,
                actual: units.len(),
            });
        }

        out.push(LEGACY_KICK);
        out.extend_from_slice(&(units.len() as u16).to_be_bytes());
        for unit in units {
            out.extend_from_slice(&unit.to_be_bytes());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(out: &mut Vec<u8>, value: &str) {
        let units: Vec<u16> = value.encode_utf16().collect();
        out.extend_from_slice(&(units.len() as u16).to_be_bytes());
        for unit in units {
            out.extend_from_slice(&unit.to_be_bytes());
        }
    }

    fn ping_host(protocol: u8, host: &str, port: i32) -> Vec<u8> {
        let mut out = vec![0xFE, 0x01, 0xFA];
        utf16(&mut out, PING_HOST_CHANNEL);
        let mut payload = vec![protocol];
        utf16(&mut payload, host);
        payload.extend_from_slice(&port.to_be_bytes());
        out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        out.extend_from_slice(&payload);
        out
    }

    #[test]
    fn decodes_full_ping_host() {
        let bytes = ping_host(78, "play.example.com", 25565);
        let (ping, used) = decode_legacy_ping(&bytes, false).unwrap().unwrap();
        assert_eq!(used, bytes.len());
        assert_eq!(ping.kind, LegacyPingKind::V1_6);
        assert_eq!(ping.protocol_version, 78);
        assert_eq!(ping.server_address, "play.example.com");
        assert_eq!(ping.server_port, 25565);
    }

    #[test]
    fn waits_for_more_bytes_until_eof() {
        let bytes = ping_host(78, "localhost", 25565);
        let partial = &bytes[..bytes.len() - 2];
        assert_eq!(decode_legacy_ping(partial, false).unwrap(), None);

        let (ping, used) = decode_legacy_ping(partial, true).unwrap().unwrap();
        assert_eq!(ping.kind, LegacyPingKind::V1_4);
        assert_eq!(used, partial.len());
    }

    #[test]
    fn bare_marker_is_a_beta_ping() {
        assert_eq!(decode_legacy_ping(&[0xFE], false).unwrap(), None);
        let (ping, used) = decode_legacy_ping(&[0xFE], true).unwrap().unwrap();
        assert_eq!(ping.kind, LegacyPingKind::Beta);
        assert_eq!(used, 1);
    }

    #[test]
    fn any_trailing_bytes_still_yield_a_ping() {
        for bytes in [
            &[0xFE, 0x00, 0x10][..],
            &[0xFE, 0x01, 0x00],
            &[0xFE, 0x01, 0xFA, 0x00, 0x01, 0xD8, 0x00],
            &[0xFE, 0x01, 0xFA, 0x00, 0x01, 0x00, 0x41, 0xFF, 0xFF],
        ] {
            let (ping, _) = decode_legacy_ping(bytes, true).unwrap().unwrap();
            assert_ne!(ping.kind, LegacyPingKind::V1_6, "{bytes:02x?}");
        }
    }

    #[test]
    fn kick_text_for_modern_legacy_clients() {
        let kick = LegacyKickS2c {
            kind: LegacyPingKind::V1_6,
            protocol_version: 772,
            version_name: "1.21.8",
            motd: "zzz",
            online_players: 0,
            max_players: 20,
        };
        assert_eq!(kick.text(), "\u{a7}1\u{0}772\u{0}1.21.8\u{0}zzz\u{0}0\u{0}20");

        let mut out = Vec::new();
        kick.encode(&mut out).unwrap();
        assert_eq!(out[0], 0xFF);
        let units = u16::from_be_bytes([out[1], out[2]]) as usize;
        assert_eq!(units, kick.text().encode_utf16().count());
        assert_eq!(out.len(), 3 + units * 2);
    }

    #[test]
    fn kick_text_for_beta_strips_section_signs() {
        let kick = LegacyKickS2c {
            kind: LegacyPingKind::Beta,
            protocol_version: 772,
            version_name: "1.21.8",
            motd: "\u{a7}6sleeping",
            online_players: 0,
            max_players: 20,
        };
        assert_eq!(kick.text(), "6sleeping\u{a7}0\u{a7}20");
    }
}
