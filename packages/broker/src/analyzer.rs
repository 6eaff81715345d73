use std::collections::HashMap;
use std::time::Duration;

use rdkafka::Offset;
use tracing::debug;

use crate::browser::{DLQ_PARTITION, assigned_consumer, run_blocking};
use crate::config::BrokerConfig;
use crate::error::BrokerError;
use crate::message::{DlqMessage, headers};

const SCAN_POLL_TIMEOUT: Duration = Duration::from_secs(1);
/// Hard cap on poll cycles per scan. Keeps a breakdown request linear and
/// bounded even on a partition that keeps receiving messages mid-scan.
const MAX_SCAN_POLLS: usize = 1000;

pub const UNKNOWN_ERROR: &str = "Unknown Error";

/// One row of an error breakdown: an exact error string, how many messages
/// carry it, and its share of everything scanned.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorBreakdownEntry {
    pub error_type: String,
    pub count: u64,
    pub percentage: f64,
}

/// Aggregates a DLQ partition by error cause.
#[derive(Debug, Clone)]
pub struct ErrorAnalyzer {
    config: BrokerConfig,
}

impl ErrorAnalyzer {
    pub fn new(config: BrokerConfig) -> Self {
        Self { config }
    }

    /// Scan partition 0 of `topic` from the earliest offset and group
    /// messages by their `X-Error-Message` header. Returns the number of
    /// messages scanned and the sorted breakdown.
    pub async fn breakdown(
        &self,
        topic: &str,
    ) -> Result<(u64, Vec<ErrorBreakdownEntry>), BrokerError> {
        let config = self.config.clone();
        let topic = topic.to_owned();
        let counts = run_blocking(move || scan_error_counts(&config, &topic)).await?;
        Ok(build_breakdown(counts))
    }
}

/// Classify a message by its error header. Absent or blank headers group
/// under [`UNKNOWN_ERROR`]; everything else groups by the exact,
/// case-sensitive header value.
pub fn classify(message: &DlqMessage) -> String {
    match message.headers.get(headers::ERROR_MESSAGE) {
        Some(value) if !value.trim().is_empty() => value.to_owned(),
        _ => UNKNOWN_ERROR.to_owned(),
    }
}

fn scan_error_counts(
    config: &BrokerConfig,
    topic: &str,
) -> Result<HashMap<String, u64>, BrokerError> {
    let consumer = assigned_consumer(config, topic, DLQ_PARTITION, Offset::Beginning)?;

    let mut counts: HashMap<String, u64> = HashMap::new();
    let mut scanned = 0u64;
    for _ in 0..MAX_SCAN_POLLS {
        match consumer.poll(SCAN_POLL_TIMEOUT) {
            Some(Ok(record)) => {
                let message = DlqMessage::from_borrowed(&record);
                *counts.entry(classify(&message)).or_insert(0) += 1;
                scanned += 1;
            }
            Some(Err(e)) => return Err(e.into()),
            // Empty poll: end of partition.
            None => break,
        }
    }

    debug!(topic, scanned, groups = counts.len(), "scanned DLQ for error breakdown");
    Ok(counts)
}

/// Turn raw counts into a sorted breakdown: count descending, ties broken
/// lexicographically by error type so the output is deterministic.
pub fn build_breakdown(counts: HashMap<String, u64>) -> (u64, Vec<ErrorBreakdownEntry>) {
    let total: u64 = counts.values().sum();

    let mut entries: Vec<ErrorBreakdownEntry> = counts
        .into_iter()
        .map(|(error_type, count)| ErrorBreakdownEntry {
            error_type,
            count,
            percentage: if total == 0 {
                0.0
            } else {
                count as f64 * 100.0 / total as f64
            },
        })
        .collect();

    entries.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.error_type.cmp(&b.error_type))
    });

    (total, entries)
}
