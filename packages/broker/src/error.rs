use std::time::Duration;

use rdkafka::error::KafkaError;
use thiserror::Error;

/// Errors surfaced by the Kafka layer.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The cluster could not be reached or a client call failed outright.
    #[error("broker unavailable: {0}")]
    Unavailable(String),

    /// The broker did not acknowledge a produce within the send timeout.
    #[error("send timed out after {0:?}")]
    SendTimeout(Duration),

    /// The broker rejected the produce (serialization, authorization,
    /// message too large, ...).
    #[error("send rejected: {0}")]
    SendRejected(String),

    /// A blocking client task was cancelled before it completed.
    #[error("operation interrupted: {0}")]
    Interrupted(String),
}

impl From<KafkaError> for BrokerError {
    fn from(err: KafkaError) -> Self {
        BrokerError::Unavailable(err.to_string())
    }
}
