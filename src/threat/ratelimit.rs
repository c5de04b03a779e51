use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DashMapStateStore;
use governor::{Quota, RateLimiter};
use std::hash::Hash;
use std::num::NonZeroU32;
use std::time::Duration;

#[derive(Debug)]
pub enum RatelimitResult {
    Allowed,
    Disallowed { retry_after: Duration },
}

pub struct Ratelimiter<K: Hash + Eq + Clone> {
    limiter: RateLimiter<K, DashMapStateStore<K>, DefaultClock>,
    retry_time: Duration,
}

impl<K> Ratelimiter<K>
where
    K: Hash + Eq + Clone + Send + Sync,
{
    pub fn new(requests_per_second: NonZeroU32, retry_time: Duration) -> Self {
        let quota = Quota::per_second(requests_per_second);
        let limiter = RateLimiter::keyed(quota);
        Ratelimiter { limiter, retry_time }
    }

    pub fn check(&self, key: &K) -> RatelimitResult {
        match self.limiter.check_key(key) {
            Ok(_) => RatelimitResult::Allowed,
            Err(negative) => {
                let calculated_retry = negative.wait_time_from(DefaultClock::default().now());
                let retry_after = calculated_retry.max(self.retry_time);
                RatelimitResult::Disallowed { retry_after }
            }
        }
    }

    /// Forget keys whose buckets are full again.
    pub fn housekeep(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    pub fn tracked_keys(&self) -> usize {
        self.limiter.len()
    }
}
