mod login;
mod status;

use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
    time::{Duration, Instant},
};

use net::{HandshakeNextState, Packet, PacketState, ProtoError, ServerboundPacket};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpListener,
    sync::{broadcast, Semaphore},
    time::interval,
};

use crate::{
    config::DrowseConfig,
    connection::EncodedConnection,
    error::ConnectionError,
    logging::DrowseLogger,
    motd::MotdManager,
    notify::{PlayerInfo, WakeDispatcher, WakeNotifier, WebhookError, WebhookNotifier},
    threat::{
        ratelimit::{RatelimitResult, Ratelimiter},
        ClientIntent, ThreatControlService,
    },
    utils::nodelay_enabled,
};

const RATE_LIMIT_HOUSEKEEPING: Duration = Duration::from_secs(60);

/// Shared state for every client connection.
pub struct Drowse {
    config: DrowseConfig,
    motd: MotdManager,
    wake: WakeDispatcher,
    threat: ThreatControlService,
}

impl Drowse {
    /// Builds the MOTD manager and, when a URL is configured, the webhook notifier.
    pub fn new(config: DrowseConfig) -> Result<Self, WebhookError> {
        let notifier = match WebhookNotifier::from_config(&config.webhook)? {
            Some(webhook) => {
                DrowseLogger::webhook_enabled(webhook.url(), webhook.require_user());
                Some(Arc::new(webhook) as Arc<dyn WakeNotifier>)
            }
            None => {
                DrowseLogger::webhook_disabled();
                None
            }
        };
        let motd = MotdManager::new(&config.status);
        Ok(Self::from_parts(config, motd, WakeDispatcher::new(notifier)))
    }

    pub fn from_parts(config: DrowseConfig, motd: MotdManager, wake: WakeDispatcher) -> Self {
        Self {
            config,
            motd,
            wake,
            threat: ThreatControlService::new(),
        }
    }

    pub fn config(&self) -> &DrowseConfig {
        &self.config
    }

    pub fn motd(&self) -> &MotdManager {
        &self.motd
    }

    pub fn wake(&self) -> &WakeDispatcher {
        &self.wake
    }

    pub async fn start(self: Arc<Self>, stop: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let address = self.config.listen_addr();
        DrowseLogger::preparing_socket(&address);
        let listener = TcpListener::bind(&address).await?;
        self.serve(listener, stop).await
    }

    /// Accept loop. Returns once `stop` fires; connections already accepted keep running.
    pub async fn serve(
        self: Arc<Self>,
        listener: TcpListener,
        mut stop: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        DrowseLogger::listening(&listener.local_addr()?);
        let semaphore = Arc::new(Semaphore::new(self.config.max_conn as usize));
        let rate_limiter: Option<Ratelimiter<IpAddr>> = NonZeroU32::new(self.config.cooldown)
            .map(|per_second| Ratelimiter::new(per_second, Duration::from_secs(1)));
        let mut housekeeping = interval(RATE_LIMIT_HOUSEKEEPING);

        loop {
            let (client, addr) = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        DrowseLogger::accept_failed(&err);
                        continue;
                    }
                },
                _ = housekeeping.tick() => {
                    if let Some(limiter) = &rate_limiter {
                        limiter.housekeep();
                        DrowseLogger::rate_limiter_housekeeping(limiter.tracked_keys());
                    }
                    continue;
                }
                _ = stop.recv() => {
                    DrowseLogger::listener_stopped();
                    return Ok(());
                }
            };

            if let Some(limiter) = &rate_limiter {
                if let RatelimitResult::Disallowed { retry_after } = limiter.check(&addr.ip()) {
                    DrowseLogger::rate_limited(&addr.ip(), retry_after);
                    drop(client);
                    continue;
                }
            }

            let permit = match semaphore.clone().try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => {
                    DrowseLogger::connection_limit_reached(&addr);
                    drop(client);
                    continue;
                }
            };

            if nodelay_enabled() {
                if let Err(e) = client.set_nodelay(true) {
                    DrowseLogger::tcp_nodelay_failed(&e);
                }
            }

            let drowse = self.clone();
            tokio::spawn(async move {
                if let Err(err) = drowse.handle_connection(client, addr).await {
                    if err.is_hangup() {
                        DrowseLogger::connection_closed(&addr, &err);
                    } else {
                        DrowseLogger::connection_error(&addr, &err);
                    }
                }
                drop(permit);
            });
        }
    }

    /// Drive one client from handshake to close.
    pub async fn handle_connection<S>(
        &self,
        stream: S,
        address: SocketAddr,
    ) -> Result<(), ConnectionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        DrowseLogger::new_connection(&address);
        let mut client = EncodedConnection::new(stream, address);

        let started = Instant::now();
        let first = self
            .threat
            .nuisance(client.recv(PacketState::Handshaking), ClientIntent::HANDSHAKE)
            .await??;

        let frame = match first {
            Packet::Frame(frame) => frame,
            Packet::LegacyPing(ping) => {
                return status::answer_legacy_ping(self, &mut client, &ping).await
            }
        };
        let handshake = match frame.decode_serverbound(PacketState::Handshaking, 0)? {
            ServerboundPacket::Handshake(handshake) => handshake,
            _ => {
                return Err(ProtoError::UnexpectedPacket {
                    state: PacketState::Handshaking,
                    id: frame.id,
                }
                .into())
            }
        };
        DrowseLogger::handshake_completed(
            &address,
            started.elapsed().as_millis() as u64,
            &handshake,
        );

        match handshake.next_state {
            HandshakeNextState::Status => {
                status::serve_status(self, &mut client, &handshake).await
            }
            HandshakeNextState::Login => {
                let player = read_player_info(&mut client, handshake.protocol_version).await?;
                login::handle_login(self, &mut client, &handshake, player).await
            }
        }
    }
}

/// Read the login start that follows a login handshake.
///
/// A stream that ends early still counts as a join attempt, just without a
/// player identity.
async fn read_player_info<S>(
    client: &mut EncodedConnection<S>,
    protocol_version: i32,
) -> Result<Option<PlayerInfo>, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let frame = match client.recv_frame(PacketState::Login).await {
        Ok(frame) => frame,
        Err(err) if err.is_truncated() => {
            DrowseLogger::login_truncated(client.addr(), &err);
            return Ok(None);
        }
        Err(err) => return Err(err),
    };

    match frame.decode_serverbound(PacketState::Login, protocol_version) {
        Ok(ServerboundPacket::LoginStart(start)) => Ok(Some(PlayerInfo {
            name: start.username.to_owned(),
            uuid: start.profile_id,
        })),
        Ok(_) => Err(ProtoError::UnexpectedPacket {
            state: PacketState::Login,
            id: frame.id,
        }
        .into()),
        Err(ProtoError::TruncatedInput) => {
            DrowseLogger::login_truncated(client.addr(), &ProtoError::TruncatedInput);
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}
