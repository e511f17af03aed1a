//! Redis PUBLISH/SUBSCRIBE transport.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use redis::{AsyncCommands, Client};

use super::{Message, PubSubError, Publisher, Subscriber, Subscription};

/// Redis-backed pub/sub.
#[derive(Clone)]
pub struct RedisPubSub {
    client: Client,
}

impl RedisPubSub {
    pub fn new(url: &str) -> Result<Self, PubSubError> {
        let client = Client::open(url).map_err(|e| {
            PubSubError::Connection(format!("Failed to create Redis client: {}", e))
        })?;
        Ok(Self { client })
    }

    /// Round-trip a PING to verify the server is reachable.
    pub async fn ping(&self) -> Result<(), PubSubError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| PubSubError::Connection(format!("Failed to connect to Redis: {}", e)))?;

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| PubSubError::Connection(format!("Redis PING failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl Publisher for RedisPubSub {
    async fn publish(&self, channel: &str, payload: &str) -> Result<usize, PubSubError> {
        let publish_err = |reason: String| PubSubError::Publish {
            channel: channel.to_string(),
            reason,
        };

        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| publish_err(e.to_string()))?;

        let receivers: usize = conn
            .publish(channel, payload)
            .await
            .map_err(|e| publish_err(e.to_string()))?;

        tracing::debug!(channel = %channel, receivers = receivers, "Published message");
        Ok(receivers)
    }
}

#[async_trait]
impl Subscriber for RedisPubSub {
    async fn subscribe(&self, channel: &str) -> Result<Box<dyn Subscription>, PubSubError> {
        let subscribe_err = |reason: String| PubSubError::Subscribe {
            channel: channel.to_string(),
            reason,
        };

        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| subscribe_err(e.to_string()))?;
        pubsub
            .subscribe(channel)
            .await
            .map_err(|e| subscribe_err(e.to_string()))?;

        tracing::info!(channel = %channel, "Subscribed to Redis channel");

        Ok(Box::new(RedisSubscription {
            channel: channel.to_string(),
            messages: pubsub.into_on_message().boxed(),
        }))
    }
}

struct RedisSubscription {
    channel: String,
    messages: BoxStream<'static, redis::Msg>,
}

#[async_trait]
impl Subscription for RedisSubscription {
    async fn next_message(&mut self) -> Result<Option<Message>, PubSubError> {
        // The message stream only ends when the connection is gone.
        let msg = self
            .messages
            .next()
            .await
            .ok_or_else(|| PubSubError::Closed(format!("Redis connection lost on {}", self.channel)))?;

        let channel = msg.get_channel_name().to_string();
        let payload: String = msg.get_payload().map_err(|e| PubSubError::Payload {
            channel: channel.clone(),
            reason: e.to_string(),
        })?;

        Ok(Some(Message { channel, payload }))
    }
}
