//! Redis pub/sub broker adapter.
//!
//! Publishing goes through one multiplexed connection shared by all
//! publishers. Every subscription opens its own dedicated pub/sub connection
//! so each listener owns its handle exclusively and teardown of one channel
//! never disturbs another.

use async_trait::async_trait;
use futures_util::StreamExt;

use super::{Broker, BrokerMessage, Subscription};
use crate::error::BusError;

/// Broker implementation on top of Redis pub/sub.
#[derive(Clone)]
pub struct RedisBroker {
    client: redis::Client,
    conn: redis::aio::MultiplexedConnection,
}

impl RedisBroker {
    /// Connects to the Redis server at `url` (e.g. `redis://127.0.0.1:6379`).
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Connect`] when the URL is invalid or the server
    /// is unreachable.
    pub async fn connect(url: &str) -> Result<Self, BusError> {
        let connect_err = |e: redis::RedisError| BusError::Connect {
            reason: e.to_string(),
        };
        let client = redis::Client::open(url).map_err(connect_err)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(connect_err)?;
        Ok(Self { client, conn })
    }
}

impl std::fmt::Debug for RedisBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBroker")
            .field("addr", &self.client.get_connection_info().addr)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Broker for RedisBroker {
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BusError> {
        let mut conn = self.conn.clone();
        let _receivers: i64 = redis::cmd("PUBLISH")
            .arg(channel)
            .arg(payload)
            .query_async(&mut conn)
            .await
            .map_err(|e| BusError::Publish {
                channel: channel.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Box<dyn Subscription>, BusError> {
        let subscription_err = |e: redis::RedisError| BusError::Subscription {
            channel: channel.to_string(),
            reason: e.to_string(),
        };
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(subscription_err)?;
        pubsub.subscribe(channel).await.map_err(subscription_err)?;
        Ok(Box::new(RedisSubscription {
            channel: channel.to_string(),
            pubsub,
        }))
    }

    async fn close(&self) -> Result<(), BusError> {
        // Redis connections are released on drop; subscriptions hold their
        // own connections and close individually.
        Ok(())
    }
}

struct RedisSubscription {
    channel: String,
    pubsub: redis::aio::PubSub,
}

#[async_trait]
impl Subscription for RedisSubscription {
    async fn next_message(&mut self) -> Result<Option<BrokerMessage>, BusError> {
        let Some(msg) = self.pubsub.on_message().next().await else {
            return Ok(None);
        };
        let payload: String = msg.get_payload().map_err(|e| BusError::Subscription {
            channel: self.channel.clone(),
            reason: e.to_string(),
        })?;
        Ok(Some(BrokerMessage {
            channel: msg.get_channel_name().to_string(),
            payload,
        }))
    }

    async fn close(&mut self) -> Result<(), BusError> {
        self.pubsub
            .unsubscribe(&self.channel)
            .await
            .map_err(|e| BusError::Subscription {
                channel: self.channel.clone(),
                reason: e.to_string(),
            })
    }
}
