//! Telemetry delivery.
//!
//! The station hands each serialized reading to a [`TelemetryPublisher`] and
//! does not look at delivery beyond logging the outcome. [`MqttPublisher`] is
//! the production path; [`LogPublisher`] and [`MemoryPublisher`] serve dry runs
//! and tests.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, MqttOptions, QoS};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BrokerConfig;

const EVENT_QUEUE_CAPACITY: usize = 10;
const EVENT_LOOP_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("MQTT client error: {0}")]
    Client(String),
    #[error("publisher is closed")]
    Closed,
    #[error("simulated delivery failure")]
    Rejected,
}

#[async_trait]
pub trait TelemetryPublisher: Send {
    /// Best-effort delivery of `payload` on `topic`.
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;

    /// Release the underlying connection. Further publishes fail.
    async fn close(&mut self) -> Result<(), PublishError> {
        Ok(())
    }
}

/// Publishes over MQTT with QoS 0, never retained.
///
/// Publishing and closing never wait on the broker: when the request queue
/// is full (broker unreachable) the call fails at once. The client's event
/// loop is driven by a background task for the lifetime of the publisher;
/// connection errors are logged there and the loop keeps polling, which is
/// how rumqttc reconnects.
pub struct MqttPublisher {
    client: AsyncClient,
    event_loop: JoinHandle<()>,
    closed: bool,
}

impl MqttPublisher {
    /// Must be called from within a tokio runtime.
    pub fn connect(broker: &BrokerConfig) -> Self {
        let mut options = MqttOptions::new(broker.client_id.clone(), broker.host.clone(), broker.port);
        options.set_keep_alive(broker.keep_alive);

        let (client, mut eventloop) = AsyncClient::new(options, EVENT_QUEUE_CAPACITY);
        info!("Connecting to MQTT broker at {}:{}", broker.host, broker.port);

        let event_loop = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(event) => debug!(?event, "MQTT event"),
                    Err(e) => {
                        warn!("MQTT event loop error: {}", e);
                        tokio::time::sleep(EVENT_LOOP_RETRY_DELAY).await;
                    }
                }
            }
        });

        Self {
            client,
            event_loop,
            closed: false,
        }
    }
}

#[async_trait]
impl TelemetryPublisher for MqttPublisher {
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        if self.closed {
            return Err(PublishError::Closed);
        }
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload.to_vec())
            .map_err(|e| PublishError::Client(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), PublishError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let result = self
            .client
            .try_disconnect()
            .map_err(|e| PublishError::Client(e.to_string()));
        self.event_loop.abort();
        result
    }
}

impl Drop for MqttPublisher {
    fn drop(&mut self) {
        self.event_loop.abort();
    }
}

/// Dry-run publisher: accepts everything. The station's own per-cycle line
/// already shows the payload, so this only logs at debug level.
#[derive(Debug, Default)]
pub struct LogPublisher;

#[async_trait]
impl TelemetryPublisher for LogPublisher {
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        debug!(topic, "[dry-run] {}", String::from_utf8_lossy(payload));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl PublishedMessage {
    pub fn payload_str(&self) -> &str {
        std::str::from_utf8(&self.payload).unwrap_or_default()
    }
}

/// Keeps every published message in memory.
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    messages: Vec<PublishedMessage>,
    rejecting: bool,
    closed: bool,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher whose every delivery fails with [`PublishError::Rejected`].
    pub fn rejecting() -> Self {
        Self {
            rejecting: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> &[PublishedMessage] {
        &self.messages
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl TelemetryPublisher for MemoryPublisher {
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        if self.closed {
            return Err(PublishError::Closed);
        }
        if self.rejecting {
            return Err(PublishError::Rejected);
        }
        self.messages.push(PublishedMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        });
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PublishError> {
        self.closed = true;
        Ok(())
    }
}
