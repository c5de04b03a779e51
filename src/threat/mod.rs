pub mod ratelimit;

use std::future::IntoFuture;
use std::time::Duration;
use tokio::time::timeout;

/// What the client is expected to do within `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIntent {
    pub tag: &'static str,
    pub duration: Duration,
}

impl ClientIntent {
    pub const HANDSHAKE: ClientIntent = ClientIntent {
        tag: "handshake",
        duration: Duration::from_secs(5),
    };
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientFail {
    #[error("Timeout while waiting for {intent} ({after:?})")]
    Timeout { intent: &'static str, after: Duration },
}

#[derive(Debug, Default)]
pub struct ThreatControlService;

impl ThreatControlService {
    pub fn new() -> Self {
        Self {}
    }

    /// A `timeout` wrapper that reports which client intent missed its deadline.
    pub async fn nuisance<F>(&self, future: F, intent: ClientIntent) -> Result<F::Output, ClientFail>
    where
        F: IntoFuture,
    {
        match timeout(intent.duration, future.into_future()).await {
            Ok(v) => Ok(v),
            Err(_) => Err(ClientFail::Timeout {
                intent: intent.tag,
                after: intent.duration,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn nuisance_passes_through_fast_futures() {
        let threat = ThreatControlService::new();
        let value = threat
            .nuisance(async { 7 }, ClientIntent::HANDSHAKE)
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn nuisance_reports_the_missed_intent() {
        let threat = ThreatControlService::new();
        let err = threat
            .nuisance(std::future::pending::<()>(), ClientIntent::HANDSHAKE)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ClientFail::Timeout {
                intent: "handshake",
                after: Duration::from_secs(5)
            }
        );
    }
}
