use async_trait::async_trait;
use serde::Serialize;
#[cfg(any(test, feature = "test-util"))]
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
#[error("event publish failed: {0}")]
pub struct PublishError(pub String);

/// Outbound channel for booking lifecycle events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), PublishError>;
}

/// Serializes and publishes after a commit. Failures are logged only; the
/// state change they describe has already happened.
pub async fn publish_event<E: Serialize>(
    publisher: &dyn EventPublisher,
    topic: &str,
    key: &str,
    event: &E,
) {
    let payload = match serde_json::to_string(event) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Failed to serialize event for {}: {}", topic, e);
            return;
        }
    };

    if let Err(e) = publisher.publish(topic, key, &payload).await {
        tracing::warn!("Dropping {} event for {}: {}", topic, key, e);
    }
}

pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, topic: &str, key: &str, _payload: &str) -> Result<(), PublishError> {
        tracing::debug!("Event {} for {} not published (no broker configured)", topic, key);
        Ok(())
    }
}

/// Keeps published events in memory, in order.
#[cfg(any(test, feature = "test-util"))]
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<(String, String, String)>>,
}

#[cfg(any(test, feature = "test-util"))]
impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topics(&self) -> Vec<String> {
        self.events
            .lock()
            .map(|events| events.iter().map(|(t, _, _)| t.clone()).collect())
            .unwrap_or_default()
    }

    pub fn payloads(&self, topic: &str) -> Vec<String> {
        self.events
            .lock()
            .map(|events| {
                events
                    .iter()
                    .filter(|(t, _, _)| t == topic)
                    .map(|(_, _, p)| p.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), PublishError> {
        let mut events = self
            .events
            .lock()
            .map_err(|e| PublishError(e.to_string()))?;
        events.push((topic.to_string(), key.to_string(), payload.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_publisher_keeps_order() {
        let publisher = RecordingPublisher::new();
        publish_event(&publisher, "a.topic", "k1", &serde_json::json!({"n": 1})).await;
        publish_event(&publisher, "b.topic", "k2", &serde_json::json!({"n": 2})).await;

        assert_eq!(publisher.topics(), vec!["a.topic", "b.topic"]);
        assert_eq!(publisher.payloads("b.topic"), vec!["{\"n\":2}"]);
    }
}
