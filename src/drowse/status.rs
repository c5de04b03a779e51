use net::{
    HandshakeC2s, LegacyKickS2c, LegacyServerListPing, PacketState, ProtoError,
    ServerboundPacket, StatusPongS2c, StatusResponseS2c,
};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};

use super::Drowse;
use crate::{
    config::StatusConfig, connection::EncodedConnection, error::ConnectionError,
    logging::DrowseLogger,
};

#[derive(Debug, Serialize)]
struct StatusResponse<'a> {
    version: StatusVersion<'a>,
    players: StatusPlayers,
    description: StatusDescription<'a>,
}

#[derive(Debug, Serialize)]
struct StatusVersion<'a> {
    name: &'a str,
    protocol: i32,
}

#[derive(Debug, Serialize)]
struct StatusPlayers {
    max: i32,
    online: i32,
}

#[derive(Debug, Serialize)]
struct StatusDescription<'a> {
    text: &'a str,
}

pub(crate) fn status_json(config: &StatusConfig, motd: &str) -> serde_json::Result<String> {
    serde_json::to_string(&StatusResponse {
        version: StatusVersion {
            name: &config.version,
            protocol: config.protocol(),
        },
        players: StatusPlayers {
            max: config.max_players,
            online: 0,
        },
        description: StatusDescription { text: motd },
    })
}

/// Status request then ping. An unexpected packet or a hangup just ends the
/// exchange; other failures are returned to the caller.
pub(super) async fn serve_status<S>(
    drowse: &Drowse,
    client: &mut EncodedConnection<S>,
    handshake: &HandshakeC2s<'_>,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match exchange(drowse, client, handshake).await {
        Ok(motd) => {
            DrowseLogger::status_served(client.addr(), handshake.server_address, motd);
            Ok(())
        }
        Err(err) if err.is_unexpected_packet() || err.is_hangup() => {
            DrowseLogger::status_aborted(client.addr(), &err);
            Ok(())
        }
        Err(err) => Err(err),
    }
}

async fn exchange<'d, S>(
    drowse: &'d Drowse,
    client: &mut EncodedConnection<S>,
    handshake: &HandshakeC2s<'_>,
) -> Result<&'d str, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let frame = client.recv_frame(PacketState::Status).await?;
    match frame.decode_serverbound(PacketState::Status, handshake.protocol_version)? {
        ServerboundPacket::StatusRequest(_) => {}
        _ => return Err(unexpected(frame.id)),
    }

    let motd = drowse.motd().current_motd().await;
    let json = status_json(&drowse.config().status, motd).map_err(std::io::Error::from)?;
    client.send(&StatusResponseS2c { json: &json }).await?;

    let frame = client.recv_frame(PacketState::Status).await?;
    let ping = match frame.decode_serverbound(PacketState::Status, handshake.protocol_version)? {
        ServerboundPacket::StatusPing(ping) => ping,
        _ => return Err(unexpected(frame.id)),
    };
    client
        .send(&StatusPongS2c {
            payload: ping.payload,
        })
        .await?;

    Ok(motd)
}

fn unexpected(id: i32) -> ConnectionError {
    ProtoError::UnexpectedPacket {
        state: PacketState::Status,
        id,
    }
    .into()
}

/// Pre-1.7 clients get the current MOTD in a kick packet; the socket closes afterwards.
pub(super) async fn answer_legacy_ping<S>(
    drowse: &Drowse,
    client: &mut EncodedConnection<S>,
    ping: &LegacyServerListPing,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let status = &drowse.config().status;
    let motd = drowse.motd().current_motd().await;
    let kick = LegacyKickS2c {
        kind: ping.kind,
        protocol_version: status.protocol(),
        version_name: &status.version,
        motd,
        online_players: 0,
        max_players: status.max_players,
    };

    let mut out = Vec::new();
    kick.encode(&mut out)?;
    client.send_raw(&out).await?;
    DrowseLogger::legacy_ping(client.addr(), ping, motd);
    Ok(())
}
