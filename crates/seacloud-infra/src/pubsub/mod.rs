//! Publish/subscribe transport used to hand thumbnail batches from the upload
//! side to the worker.
//!
//! Delivery is fire-and-forget: a message published while nobody is
//! subscribed is lost, and nothing is acknowledged or redelivered.

mod memory;
#[cfg(feature = "pubsub-redis")]
mod redis;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::InMemoryPubSub;
#[cfg(feature = "pubsub-redis")]
pub use self::redis::RedisPubSub;

/// One message received on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub channel: String,
    pub payload: String,
}

#[derive(Debug, Error)]
pub enum PubSubError {
    #[error("Pub/sub connection error: {0}")]
    Connection(String),

    #[error("Subscribe to {channel} failed: {reason}")]
    Subscribe { channel: String, reason: String },

    #[error("Publish to {channel} failed: {reason}")]
    Publish { channel: String, reason: String },

    #[error("Subscription closed: {0}")]
    Closed(String),

    #[error("Unreadable payload on {channel}: {reason}")]
    Payload { channel: String, reason: String },
}

impl PubSubError {
    /// Whether the subscription can no longer deliver messages.
    ///
    /// A single unreadable payload leaves the subscription usable.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PubSubError::Payload { .. })
    }
}

/// Sending side of the transport.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish `payload` on `channel`, returning how many subscribers received it.
    async fn publish(&self, channel: &str, payload: &str) -> Result<usize, PubSubError>;
}

/// Factory for subscriptions.
#[async_trait]
pub trait Subscriber: Send + Sync {
    async fn subscribe(&self, channel: &str) -> Result<Box<dyn Subscription>, PubSubError>;
}

/// An active subscription to one channel.
#[async_trait]
pub trait Subscription: Send {
    /// Wait for the next message.
    ///
    /// `Ok(None)` means the subscription was closed deliberately and no more
    /// messages will arrive.
    async fn next_message(&mut self) -> Result<Option<Message>, PubSubError>;
}
