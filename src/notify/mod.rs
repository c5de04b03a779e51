pub mod webhook;

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use net::Uuid;
use tokio::{task::JoinSet, time::timeout};

use crate::logging::DrowseLogger;

pub use webhook::{WebhookError, WebhookNotifier};

/// Identity taken from a login start packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfo {
    pub name: String,
    /// Nil when the client did not send one.
    pub uuid: Uuid,
}

/// One client that asked to log in while the server sleeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinAttempt {
    pub client: SocketAddr,
    pub server_address: String,
    pub server_port: u16,
    pub protocol_version: i32,
    /// Absent when the stream ended before a complete login start.
    pub player: Option<PlayerInfo>,
}

/// Receives join attempts so something outside can start the real server.
#[async_trait]
pub trait WakeNotifier: Send + Sync {
    async fn notify(&self, attempt: &JoinAttempt) -> anyhow::Result<()>;
}

/// Runs notifications in the background; the login path never waits on them.
pub struct WakeDispatcher {
    notifier: Option<Arc<dyn WakeNotifier>>,
    tasks: Mutex<JoinSet<()>>,
}

impl WakeDispatcher {
    pub fn new(notifier: Option<Arc<dyn WakeNotifier>>) -> Self {
        Self {
            notifier,
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.notifier.is_some()
    }

    /// Spawn one notification. Failures are logged and never retried.
    pub fn dispatch(&self, attempt: JoinAttempt) {
        let Some(notifier) = self.notifier.clone() else {
            return;
        };

        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        while let Some(finished) = tasks.try_join_next() {
            if let Err(err) = finished {
                DrowseLogger::notification_panicked(&err);
            }
        }
        tasks.spawn(async move {
            if let Err(err) = notifier.notify(&attempt).await {
                DrowseLogger::webhook_failure(&attempt.client, &err);
            }
        });
    }

    /// Notifications spawned and not yet reaped.
    pub fn in_flight(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Wait up to `limit` for outstanding notifications, aborting whatever is left.
    /// Returns how many finished in time.
    pub async fn drain(&self, limit: Duration) -> usize {
        let mut tasks = std::mem::take(
            &mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner),
        );
        DrowseLogger::draining_notifications(tasks.len(), limit);

        let mut finished = 0;
        let waited = timeout(limit, async {
            while let Some(result) = tasks.join_next().await {
                if let Err(err) = result {
                    DrowseLogger::notification_panicked(&err);
                }
                finished += 1;
            }
        })
        .await;

        if waited.is_err() {
            DrowseLogger::drain_timed_out(limit);
            tasks.abort_all();
        }
        finished
    }
}
