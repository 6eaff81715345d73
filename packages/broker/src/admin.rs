use std::time::Duration;

use rdkafka::consumer::{BaseConsumer, Consumer};

use crate::browser::run_blocking;
use crate::config::BrokerConfig;
use crate::error::BrokerError;

const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Cluster-level metadata queries, used by DLQ topic discovery.
#[derive(Debug, Clone)]
pub struct ClusterAdmin {
    config: BrokerConfig,
}

impl ClusterAdmin {
    pub fn new(config: BrokerConfig) -> Self {
        Self { config }
    }

    /// Names of all user-visible topics on the cluster. Internal topics
    /// (`__consumer_offsets` and friends) are filtered out.
    pub async fn list_topic_names(&self) -> Result<Vec<String>, BrokerError> {
        let config = self.config.clone();
        run_blocking(move || {
            let consumer: BaseConsumer = config.browse_config().create()?;
            let metadata = consumer.fetch_metadata(None, METADATA_TIMEOUT)?;

            let mut names: Vec<String> = metadata
                .topics()
                .iter()
                .map(|t| t.name().to_owned())
                .filter(|name| !name.starts_with("__"))
                .collect();
            names.sort();
            Ok(names)
        })
        .await
    }
}
