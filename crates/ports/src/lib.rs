//! Seam traits consumed by the dispatcher, worker agent and job
//! service. Adapters live in `faena-adapters`.

pub mod bus;
pub mod store;

pub use bus::{BusError, BusMessage, MessageBus, Subscription, SUBSCRIPTION_BUFFER};
pub use store::{Store, StoreError};
