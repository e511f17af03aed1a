//! In-process pub/sub on top of tokio broadcast channels.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use super::{Message, PubSubError, Publisher, Subscriber, Subscription};

const CHANNEL_CAPACITY: usize = 1024;

/// In-memory transport for tests and single-process setups.
///
/// Cloning shares the same set of channels.
#[derive(Clone, Default)]
pub struct InMemoryPubSub {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<String>>>>,
}

impl InMemoryPubSub {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, channel: &str) -> Result<broadcast::Sender<String>, PubSubError> {
        let mut channels = self
            .channels
            .lock()
            .map_err(|_| PubSubError::Connection("in-memory channel registry poisoned".into()))?;
        Ok(channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone())
    }

    /// Close every channel. Subscribers drain what was already published and
    /// then see the end of their subscription.
    pub fn close(&self) {
        if let Ok(mut channels) = self.channels.lock() {
            channels.clear();
        }
    }
}

#[async_trait]
impl Publisher for InMemoryPubSub {
    async fn publish(&self, channel: &str, payload: &str) -> Result<usize, PubSubError> {
        let sender = self.sender(channel)?;
        // No receivers is not an error: the message is simply dropped.
        Ok(sender.send(payload.to_string()).unwrap_or(0))
    }
}

#[async_trait]
impl Subscriber for InMemoryPubSub {
    async fn subscribe(&self, channel: &str) -> Result<Box<dyn Subscription>, PubSubError> {
        let receiver = self.sender(channel)?.subscribe();
        Ok(Box::new(InMemorySubscription {
            channel: channel.to_string(),
            receiver,
        }))
    }
}

struct InMemorySubscription {
    channel: String,
    receiver: broadcast::Receiver<String>,
}

#[async_trait]
impl Subscription for InMemorySubscription {
    async fn next_message(&mut self) -> Result<Option<Message>, PubSubError> {
        loop {
            match self.receiver.recv().await {
                Ok(payload) => {
                    return Ok(Some(Message {
                        channel: self.channel.clone(),
                        payload,
                    }))
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        channel = %self.channel,
                        skipped = skipped,
                        "In-memory subscriber lagged, messages dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(None),
            }
        }
    }
}
