use net::HandshakeC2s;
use tokio::io::{AsyncRead, AsyncWrite};

use super::Drowse;
use crate::{
    connection::EncodedConnection,
    error::ConnectionError,
    logging::DrowseLogger,
    notify::{JoinAttempt, PlayerInfo},
};

/// Flip the MOTD to starting, fire the wake notification and send the client away.
pub(super) async fn handle_login<S>(
    drowse: &Drowse,
    client: &mut EncodedConnection<S>,
    handshake: &HandshakeC2s<'_>,
    player: Option<PlayerInfo>,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    drowse.motd().on_join_attempt().await;

    let attempt = JoinAttempt {
        client: *client.addr(),
        server_address: handshake.server_address.to_owned(),
        server_port: handshake.server_port,
        protocol_version: handshake.protocol_version,
        player,
    };
    DrowseLogger::join_attempt(&attempt);
    drowse.wake().dispatch(attempt);

    let reason = &drowse.config().disconnect_message;
    if let Err(err) = client.disconnect(reason).await {
        DrowseLogger::disconnect_failure(client.addr(), &err);
        return Err(err);
    }
    DrowseLogger::disconnect_sent(client.addr(), reason);
    let _ = client.shutdown().await;
    Ok(())
}
