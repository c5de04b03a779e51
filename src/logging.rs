use std::{
    fmt::Display,
    net::{IpAddr, SocketAddr},
    path::Path,
    time::Duration,
};

use log::{debug, error, info, warn};
use net::{HandshakeC2s, LegacyServerListPing};

use crate::notify::{JoinAttempt, PlayerInfo};

pub struct DrowseLogger;

struct Player<'a>(Option<&'a PlayerInfo>);

impl Display for Player<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(player) => write!(f, "{} ({})", player.name, player.uuid),
            None => f.write_str("<unknown>"),
        }
    }
}

impl DrowseLogger {
    pub fn preparing_socket(address: &str) {
        info!("Preparing socket {}", address);
    }

    pub fn listening(address: &SocketAddr) {
        info!("Listening for Minecraft client connections on {address}");
    }

    pub fn accept_failed(err: &std::io::Error) {
        error!("Failed to accept connection: {err}");
    }

    pub fn listener_stopped() {
        info!("Stopped accepting connections");
    }

    pub fn rate_limited(ip: &IpAddr, retry_after: Duration) {
        debug!("Rate-limited {ip} (retry after {retry_after:?})");
    }

    pub fn rate_limiter_housekeeping(tracked: usize) {
        debug!("Rate limiter tracking {tracked} addresses");
    }

    pub fn connection_limit_reached(address: &SocketAddr) {
        warn!("Connection limit reached, dropping {address}");
    }

    pub fn tcp_nodelay_failed(err: &std::io::Error) {
        error!("Failed to set TCP_NODELAY: {err}");
    }

    pub fn new_connection(address: &SocketAddr) {
        debug!("New connection {}", address);
    }

    pub fn handshake_completed(address: &SocketAddr, elapsed_ms: u64, handshake: &HandshakeC2s) {
        debug!(
            "Handshake from {} completed in {}ms: protocol {}, server {}:{}, next state: {}",
            address,
            elapsed_ms,
            handshake.protocol_version,
            handshake.server_address,
            handshake.server_port,
            handshake.next_state.as_str()
        );
    }

    pub fn legacy_ping(address: &SocketAddr, ping: &LegacyServerListPing, motd: &str) {
        info!(
            "Answered {:?} legacy ping from {} (server '{}', protocol {}) with motd '{}'",
            ping.kind, address, ping.server_address, ping.protocol_version, motd
        );
    }

    pub fn status_served(address: &SocketAddr, server: &str, motd: &str) {
        info!("Handled status request from {address} for '{server}' with motd '{motd}'");
    }

    pub fn status_aborted(address: &SocketAddr, err: &dyn Display) {
        debug!("Status exchange with {address} ended early: {err}");
    }

    pub fn login_truncated(address: &SocketAddr, err: &dyn Display) {
        warn!("Truncated buffer while reading player info from {address}: {err}");
    }

    pub fn join_attempt(attempt: &JoinAttempt) {
        info!(
            "Join attempt from {} for '{}' by {}, server is starting up",
            attempt.client,
            attempt.server_address,
            Player(attempt.player.as_ref())
        );
    }

    pub fn motd_starting(timeout: Duration) {
        info!("Showing starting MOTD for the next {timeout:?}");
    }

    pub fn disconnect_sent(address: &SocketAddr, reason: &str) {
        info!("Disconnected {address} with startup message '{reason}'");
    }

    pub fn disconnect_failure(address: &SocketAddr, err: &dyn Display) {
        debug!("Failed to send disconnect to {address}: {err}");
    }

    pub fn connection_closed(address: &SocketAddr, err: &dyn Display) {
        debug!("Connection {address} closed: {err}");
    }

    pub fn connection_error(client: &SocketAddr, err: &dyn Display) {
        if dotenvy::var("DO_NOT_LOG_CONNECTION_ERROR").is_ok() {
            return;
        }
        error!("connection error@{client}: {}", err);
    }

    pub fn webhook_enabled(url: &str, require_user: bool) {
        info!("Using webhook {url} for join notifications (require user: {require_user})");
    }

    pub fn webhook_disabled() {
        info!("No webhook configured, join attempts will only be logged");
    }

    pub fn webhook_skipped(client: &SocketAddr) {
        debug!("Skipping webhook for {client}: no player identity");
    }

    pub fn webhook_delivered(client: &SocketAddr, status: impl Display) {
        debug!("Webhook for {client} answered {status}");
    }

    pub fn webhook_failure(client: &SocketAddr, err: &dyn Display) {
        error!("Webhook notification for {client} failed: {err:#}");
    }

    pub fn notification_panicked(err: &dyn Display) {
        error!("Wake notification task failed: {err}");
    }

    pub fn draining_notifications(pending: usize, limit: Duration) {
        if pending > 0 {
            info!("Waiting up to {limit:?} for {pending} wake notification(s)");
        }
    }

    pub fn drain_timed_out(limit: Duration) {
        warn!("Wake notifications still running after {limit:?}, aborting them");
    }

    pub fn unknown_config_key(key: &str, value: &dyn std::fmt::Debug) {
        warn!("Unknown configuration '{}' with value {:?}", key, value);
    }

    pub fn config_created(path: &Path) {
        info!("Wrote default configuration to {}", path.display());
    }

    pub fn shutdown_signal() {
        info!("Received signal, stopping...");
    }
}
