// src/enrich/throttle.rs
use std::time::Duration;

use async_trait::async_trait;

/// Pause taken between consecutive provider calls.
#[async_trait]
pub trait Throttle: Send + Sync {
    async fn pause(&self);
}

/// Unconditional sleep of a fixed length.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    interval: Duration,
}

impl FixedDelay {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[async_trait]
impl Throttle for FixedDelay {
    async fn pause(&self) {
        if !self.interval.is_zero() {
            tracing::debug!(secs = self.interval.as_secs_f32(), "throttling before next stage");
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// Counts pauses instead of sleeping.
#[derive(Debug, Default)]
pub struct CountingThrottle {
    pauses: std::sync::atomic::AtomicUsize,
}

impl CountingThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> usize {
        self.pauses.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl Throttle for CountingThrottle {
    async fn pause(&self) {
        self.pauses
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}
