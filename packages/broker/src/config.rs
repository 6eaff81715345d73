use rdkafka::ClientConfig;
use uuid::Uuid;

/// Connection settings shared by every Kafka client this crate creates.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub bootstrap_servers: String,
}

impl BrokerConfig {
    pub fn new(bootstrap_servers: impl Into<String>) -> Self {
        Self {
            bootstrap_servers: bootstrap_servers.into(),
        }
    }

    /// Base client configuration with the bootstrap servers applied.
    pub(crate) fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config.set("bootstrap.servers", &self.bootstrap_servers);
        config
    }

    /// Configuration for a throwaway browse consumer.
    ///
    /// The group id is randomized per call so concurrent browse requests never
    /// share committed state, and offsets are never committed at all.
    pub(crate) fn browse_config(&self) -> ClientConfig {
        let mut config = self.client_config();
        config
            .set("group.id", format!("dlq-manager-browser-{}", Uuid::new_v4()))
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest");
        config
    }
}
