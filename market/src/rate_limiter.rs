use dashmap::DashMap;
use ringbuffer::{AllocRingBuffer, RingBuffer};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

const WINDOW: Duration = Duration::from_secs(1);

pub(crate) struct RateLimiter {
    times: AllocRingBuffer<Instant>,
    limit: usize,
}

impl RateLimiter {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            times: AllocRingBuffer::new(limit),
            limit,
        }
    }

    /// Records a request at `now` if the window allows it, otherwise returns how long to wait.
    pub(crate) fn check_and_update(&mut self, now: Instant) -> Option<Duration> {
        if self.times.len() < self.limit {
            self.times.push(now);
            return None;
        }

        let next_slot = match self.times.get(0) {
            Some(oldest) => *oldest + WINDOW,
            None => return None,
        };

        if now >= next_slot {
            self.times.dequeue();
            self.times.push(now);
            None
        } else {
            Some(next_slot - now)
        }
    }
}

/// Request pacing shared by every client, one window per API key.
///
/// Pool keys are used by many accounts at once, so the limits live outside any
/// single [`crate::Client`].
#[derive(Clone)]
pub struct RateLimits {
    limiters: Arc<DashMap<String, RateLimiter>>,
    per_second: usize,
}

impl RateLimits {
    pub fn new(per_second: usize) -> Self {
        Self {
            limiters: Arc::new(DashMap::new()),
            per_second: per_second.max(1),
        }
    }

    pub(crate) async fn wait(&self, key: &str) {
        loop {
            let delay = self
                .limiters
                .entry(key.to_string())
                .or_insert_with(|| RateLimiter::new(self.per_second))
                .check_and_update(Instant::now());

            match delay {
                None => break,
                Some(delay) => sleep(delay).await,
            }
        }
    }
}
