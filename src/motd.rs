//! Sleeping/starting MOTD selection.
//!
//! A join attempt switches the advertised MOTD to the starting message for a
//! fixed window. Expiry is evaluated on read, so there is no timer task.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::{sync::RwLock, time::Instant};

use crate::{
    config::{StatusConfig, MAX_STARTING_TIMEOUT},
    logging::DrowseLogger,
};

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

/// Tokio's clock, so paused test runtimes control it too.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl ManualClock {
    pub fn new(start: Instant) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct MotdManager {
    sleeping: String,
    starting: String,
    starting_timeout: Duration,
    starting_until: RwLock<Option<Instant>>,
    clock: Arc<dyn Clock>,
}

impl MotdManager {
    pub fn new(config: &StatusConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &StatusConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            sleeping: config.sleeping_motd.clone(),
            starting: config.starting_motd.clone(),
            starting_timeout: config.starting_timeout(),
            starting_until: RwLock::new(None),
            clock,
        }
    }

    pub async fn is_starting(&self) -> bool {
        let starting_until = *self.starting_until.read().await;
        matches!(starting_until, Some(until) if self.clock.now() < until)
    }

    pub async fn current_motd(&self) -> &str {
        if self.is_starting().await {
            &self.starting
        } else {
            &self.sleeping
        }
    }

    /// Show the starting MOTD for the configured window, counted from now.
    /// Returns the new expiry.
    pub async fn on_join_attempt(&self) -> Instant {
        let mut starting_until = self.starting_until.write().await;
        let now = self.clock.now();
        let until = now
            .checked_add(self.starting_timeout)
            .or_else(|| now.checked_add(MAX_STARTING_TIMEOUT))
            .unwrap_or(now);
        *starting_until = Some(until);
        DrowseLogger::motd_starting(self.starting_timeout);
        until
    }

    pub async fn starting_until(&self) -> Option<Instant> {
        *self.starting_until.read().await
    }
}
