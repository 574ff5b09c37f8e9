//! NATS implementation of the injector's message bus.

use daq_core::collaborators::{BusError, MessageBus};
use tracing::{debug, info};

use crate::error::AppError;

/// NATS client publishing event descriptors and status lines.
pub struct NatsBus {
    client: async_nats::Client,
}

impl NatsBus {
    /// Connect to a NATS server.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Nats`] if the connection cannot be established.
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        info!(url = url, "Connecting to NATS server");
        let client = async_nats::connect(url).await.map_err(|e| AppError::Nats {
            message: format!("failed to connect to {url}: {e}"),
        })?;
        info!("NATS connection established");
        Ok(Self { client })
    }
}

impl MessageBus for NatsBus {
    /// Publish and flush, so a broken connection surfaces on this call
    /// rather than on a later one.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BusError> {
        debug!(topic = topic, bytes = payload.len(), "Publishing");
        let fail = |e: &dyn std::fmt::Display| BusError {
            topic: topic.to_owned(),
            message: e.to_string(),
        };
        self.client
            .publish(topic.to_owned(), payload.into())
            .await
            .map_err(|e| fail(&e))?;
        self.client.flush().await.map_err(|e| fail(&e))
    }
}

impl std::fmt::Debug for NatsBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsBus")
            .field("state", &self.client.connection_state())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[tokio::test]
    #[ignore = "requires a running NATS server on localhost:4222"]
    async fn publish_reaches_subscriber() {
        let bus = NatsBus::connect("nats://localhost:4222").await.unwrap();
        let mut subscriber = bus.client.subscribe("daq.test").await.unwrap();
        bus.publish("daq.test", b"hello".to_vec()).await.unwrap();
        let message = subscriber.next().await.unwrap();
        assert_eq!(message.payload.as_ref(), b"hello");
    }

    #[tokio::test]
    async fn unreachable_server_is_an_error() {
        let result = NatsBus::connect("nats://127.0.0.1:1").await;
        assert!(matches!(result, Err(AppError::Nats { .. })));
    }
}
