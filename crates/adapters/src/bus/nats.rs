//! NATS bus adapter.
//!
//! Plain core NATS pub/sub, not JetStream: the bus contract is
//! best-effort fan-out with no delivery receipt, which is exactly the
//! at-most-once core client. Each subscription runs a forwarder task
//! that bridges the broker subscription into the bounded port channel
//! and unsubscribes once the receiver is dropped.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use faena_ports::{BusError, BusMessage, MessageBus, Subscription, SUBSCRIPTION_BUFFER};

/// Message bus backed by a NATS broker.
pub struct NatsBus {
    client: async_nats::Client,
}

impl NatsBus {
    /// Connect to the broker. Connection failure here is fatal to the
    /// component being wired; callers surface it to the runtime.
    pub async fn connect(url: &str) -> Result<Self, BusError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| BusError::Connect(format!("{url}: {e}")))?;
        debug!(broker = url, "connected to NATS");
        Ok(Self { client })
    }
}

#[async_trait]
impl MessageBus for NatsBus {
    async fn publish(&self, subject: &str, payload: Bytes) -> Result<(), BusError> {
        self.client
            .publish(subject.to_string(), payload)
            .await
            .map_err(|e| BusError::publish(subject, e))
    }

    async fn subscribe(&self, subject: &str) -> Result<Subscription, BusError> {
        let mut subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .map_err(|e| BusError::subscribe(subject, e))?;

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let forwarded_subject = subject.to_string();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    next = subscriber.next() => match next {
                        Some(msg) => {
                            let out = BusMessage {
                                subject: msg.subject.to_string(),
                                payload: msg.payload,
                            };
                            match tx.try_send(out) {
                                Ok(()) => {}
                                Err(mpsc::error::TrySendError::Full(_)) => {
                                    warn!(
                                        subject = %forwarded_subject,
                                        "dropping message for slow subscriber"
                                    );
                                }
                                Err(mpsc::error::TrySendError::Closed(_)) => break,
                            }
                        }
                        None => break,
                    },
                }
            }
            if let Err(e) = subscriber.unsubscribe().await {
                debug!(subject = %forwarded_subject, error = %e, "unsubscribe failed");
            }
        });

        Ok(Subscription::new(rx))
    }
}
