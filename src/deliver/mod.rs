// src/deliver/mod.rs
//! Delivery adapters. One message, one destination, one attempt: the run
//! controller decides what a failure means.

pub mod telegram;

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

pub use telegram::TelegramDeliverer;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("missing delivery credential {0}")]
    MissingCredentials(&'static str),
    /// Built with the request URL stripped; Bot API URLs carry the token.
    #[error("delivery request failed: {0}")]
    Transport(reqwest::Error),
    #[error("channel rejected the message (status {status}): {description}")]
    Rejected { status: u16, description: String },
}

#[async_trait]
pub trait Deliverer: Send + Sync {
    async fn deliver(&self, message: &str, destination: &str) -> Result<(), DeliveryError>;
    fn channel_name(&self) -> &'static str;
}

/// Logs the message instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunDeliverer;

#[async_trait]
impl Deliverer for DryRunDeliverer {
    async fn deliver(&self, message: &str, destination: &str) -> Result<(), DeliveryError> {
        info!(
            destination,
            chars = message.chars().count(),
            "dry run: message not sent"
        );
        tracing::debug!(%message, "dry run message body");
        Ok(())
    }

    fn channel_name(&self) -> &'static str {
        "dry-run"
    }
}

// --- Test helper ---

/// Keeps every delivered message in memory. Built with `failing()` it
/// rejects every message instead.
#[derive(Debug, Default)]
pub struct RecordingDeliverer {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingDeliverer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// `(destination, message)` pairs in delivery order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("recording deliverer poisoned").clone()
    }
}

#[async_trait]
impl Deliverer for RecordingDeliverer {
    async fn deliver(&self, message: &str, destination: &str) -> Result<(), DeliveryError> {
        if self.fail {
            return Err(DeliveryError::Rejected {
                status: 400,
                description: "recording deliverer set to fail".to_string(),
            });
        }
        self.sent
            .lock()
            .expect("recording deliverer poisoned")
            .push((destination.to_string(), message.to_string()));
        Ok(())
    }

    fn channel_name(&self) -> &'static str {
        "recording"
    }
}
