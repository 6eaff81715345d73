use std::time::Duration;

use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use tracing::{debug, info};

use crate::config::BrokerConfig;
use crate::error::BrokerError;
use crate::message::MessageHeaders;

const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Producer used to send DLQ messages back to their source topics.
///
/// One instance lives for the whole process and is shared across requests;
/// the underlying client is thread-safe. Configured for safety over
/// throughput: idempotent, full-ISR acks, bounded retries.
#[derive(Clone)]
pub struct ReplayProducer {
    producer: FutureProducer,
}

impl ReplayProducer {
    pub fn new(config: &BrokerConfig) -> Result<Self, BrokerError> {
        let producer: FutureProducer = config
            .client_config()
            .set("client.id", "dlq-manager-replay-producer")
            .set("acks", "all")
            .set("enable.idempotence", "true")
            .set("message.send.max.retries", "3")
            .set("request.timeout.ms", "30000")
            .set("message.timeout.ms", "30000")
            .set("compression.type", "snappy")
            .create()?;

        Ok(Self { producer })
    }

    /// Send one message and wait for the broker's acknowledgment. Returns
    /// the destination partition and offset assigned by the broker.
    pub async fn send(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
        headers: &MessageHeaders,
    ) -> Result<(i32, i64), BrokerError> {
        let mut owned = OwnedHeaders::new_with_capacity(headers.len());
        for (header_key, value) in headers.iter() {
            owned = owned.insert(Header {
                key: header_key,
                value: Some(value.as_bytes()),
            });
        }

        let mut record: FutureRecord<'_, str, [u8]> =
            FutureRecord::to(topic).payload(payload).headers(owned);
        if let Some(key) = key {
            record = record.key(key);
        }

        match self.producer.send(record, Timeout::After(SEND_TIMEOUT)).await {
            Ok(delivery) => {
                let (partition, offset) = (delivery.partition, delivery.offset);
                debug!(topic, key, partition, offset, "message replayed");
                Ok((partition, offset))
            }
            Err((KafkaError::MessageProduction(RDKafkaErrorCode::MessageTimedOut), _)) => {
                Err(BrokerError::SendTimeout(SEND_TIMEOUT))
            }
            Err((e, _)) => Err(BrokerError::SendRejected(e.to_string())),
        }
    }

    /// Wait for all in-flight sends to be acknowledged. Called once during
    /// shutdown, before the producer is dropped.
    pub async fn flush(&self, timeout: Duration) -> Result<(), BrokerError> {
        let producer = self.producer.clone();
        tokio::task::spawn_blocking(move || {
            producer
                .flush(Timeout::After(timeout))
                .map_err(BrokerError::from)
        })
        .await
        .map_err(|e| BrokerError::Interrupted(e.to_string()))??;

        info!("replay producer flushed");
        Ok(())
    }
}
