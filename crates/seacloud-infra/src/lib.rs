//! SeaCloud Infrastructure Library
//!
//! Shared infrastructure for SeaCloud services:
//! - Telemetry initialization (tracing subscriber)
//! - Pub/sub transport (Redis, in-memory)

#[cfg(feature = "observability-basic")]
pub mod telemetry;

pub mod pubsub;

// Re-export commonly used types
#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry};

#[cfg(feature = "pubsub-redis")]
pub use pubsub::RedisPubSub;
pub use pubsub::{InMemoryPubSub, Message, PubSubError, Publisher, Subscriber, Subscription};
