//! Message bus port.
//!
//! The bus is call-and-forget pub/sub over string subjects: publishes
//! are best-effort fan-out with per-publisher per-subject ordering and
//! no delivery receipt; subscriptions are bounded channels that drop
//! for slow consumers rather than block the publisher.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;

/// Buffer size of every subscription channel.
pub const SUBSCRIPTION_BUFFER: usize = 64;

/// Errors surfaced by bus adapters.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("bus connect failed: {0}")]
    Connect(String),

    #[error("publish failed on {subject}: {reason}")]
    Publish { subject: String, reason: String },

    #[error("subscribe failed on {subject}: {reason}")]
    Subscribe { subject: String, reason: String },
}

impl BusError {
    pub fn publish(subject: impl Into<String>, reason: impl ToString) -> Self {
        Self::Publish {
            subject: subject.into(),
            reason: reason.to_string(),
        }
    }

    pub fn subscribe(subject: impl Into<String>, reason: impl ToString) -> Self {
        Self::Subscribe {
            subject: subject.into(),
            reason: reason.to_string(),
        }
    }
}

/// One message delivered on a subscription.
#[derive(Debug, Clone)]
pub struct BusMessage {
    pub subject: String,
    pub payload: Bytes,
}

/// A live subscription. Dropping it closes the backing channel and
/// detaches the subject on the adapter side.
pub struct Subscription {
    rx: mpsc::Receiver<BusMessage>,
}

impl Subscription {
    pub fn new(rx: mpsc::Receiver<BusMessage>) -> Self {
        Self { rx }
    }

    /// Next message, or `None` once the subscription is closed.
    pub async fn recv(&mut self) -> Option<BusMessage> {
        self.rx.recv().await
    }
}

/// Narrow pub/sub surface shared by all bus adapters.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, subject: &str, payload: Bytes) -> Result<(), BusError>;

    async fn subscribe(&self, subject: &str) -> Result<Subscription, BusError>;
}
