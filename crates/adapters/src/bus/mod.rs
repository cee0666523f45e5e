//! Bus adapters.
//!
//! `InMemoryBus` serves hermetic tests and single-process runs;
//! `NatsBus` speaks to a real broker. Both honor the same contract:
//! bounded subscription channels, non-blocking publishers, drops for
//! slow consumers.

pub mod nats;

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::warn;

use faena_ports::{BusError, BusMessage, MessageBus, Subscription, SUBSCRIPTION_BUFFER};

/// In-process pub/sub over exact subject matches.
///
/// Each subscription owns a bounded channel; publishing walks the
/// senders registered for the subject and drops the message for any
/// subscriber whose buffer is full.
#[derive(Default)]
pub struct InMemoryBus {
    topics: Mutex<HashMap<String, Vec<mpsc::Sender<BusMessage>>>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions on a subject.
    pub fn subscriber_count(&self, subject: &str) -> usize {
        let mut topics = self.topics.lock().expect("bus registry poisoned");
        match topics.get_mut(subject) {
            Some(senders) => {
                senders.retain(|tx| !tx.is_closed());
                senders.len()
            }
            None => 0,
        }
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn publish(&self, subject: &str, payload: Bytes) -> Result<(), BusError> {
        let senders = {
            let mut topics = self.topics.lock().expect("bus registry poisoned");
            match topics.get_mut(subject) {
                Some(senders) => {
                    senders.retain(|tx| !tx.is_closed());
                    senders.clone()
                }
                None => return Ok(()),
            }
        };

        for tx in senders {
            let msg = BusMessage {
                subject: subject.to_string(),
                payload: payload.clone(),
            };
            match tx.try_send(msg) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(subject, "dropping message for slow subscriber");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }
        Ok(())
    }

    async fn subscribe(&self, subject: &str) -> Result<Subscription, BusError> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        self.topics
            .lock()
            .expect("bus registry poisoned")
            .entry(subject.to_string())
            .or_default()
            .push(tx);
        Ok(Subscription::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_to_matching_subject_only() {
        let bus = InMemoryBus::new();
        let mut sub = bus.subscribe("a.b").await.unwrap();

        bus.publish("a.b", Bytes::from_static(b"hit")).await.unwrap();
        bus.publish("a.c", Bytes::from_static(b"miss")).await.unwrap();

        let msg = sub.recv().await.unwrap();
        assert_eq!(msg.subject, "a.b");
        assert_eq!(&msg.payload[..], b"hit");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_ok() {
        let bus = InMemoryBus::new();
        assert!(bus.publish("void", Bytes::from_static(b"x")).await.is_ok());
    }

    #[tokio::test]
    async fn fans_out_to_all_subscribers() {
        let bus = InMemoryBus::new();
        let mut a = bus.subscribe("s").await.unwrap();
        let mut b = bus.subscribe("s").await.unwrap();

        bus.publish("s", Bytes::from_static(b"m")).await.unwrap();

        assert_eq!(&a.recv().await.unwrap().payload[..], b"m");
        assert_eq!(&b.recv().await.unwrap().payload[..], b"m");
    }

    #[tokio::test]
    async fn slow_subscriber_drops_instead_of_blocking() {
        let bus = InMemoryBus::new();
        let mut sub = bus.subscribe("s").await.unwrap();

        for i in 0..(SUBSCRIPTION_BUFFER + 10) {
            bus.publish("s", Bytes::from(format!("{i}"))).await.unwrap();
        }

        // The buffer holds exactly SUBSCRIPTION_BUFFER messages; the
        // overflow was dropped, and the publisher never blocked.
        let mut received = 0;
        while let Ok(Some(_)) =
            tokio::time::timeout(std::time::Duration::from_millis(20), sub.recv()).await
        {
            received += 1;
        }
        assert_eq!(received, SUBSCRIPTION_BUFFER);
    }

    #[tokio::test]
    async fn dropped_subscription_is_pruned() {
        let bus = InMemoryBus::new();
        let sub = bus.subscribe("s").await.unwrap();
        assert_eq!(bus.subscriber_count("s"), 1);

        drop(sub);
        bus.publish("s", Bytes::from_static(b"m")).await.unwrap();
        assert_eq!(bus.subscriber_count("s"), 0);
    }

    #[tokio::test]
    async fn per_subject_ordering_is_preserved() {
        let bus = InMemoryBus::new();
        let mut sub = bus.subscribe("s").await.unwrap();

        for i in 0..10u8 {
            bus.publish("s", Bytes::from(vec![i])).await.unwrap();
        }
        for i in 0..10u8 {
            assert_eq!(sub.recv().await.unwrap().payload[0], i);
        }
    }
}
