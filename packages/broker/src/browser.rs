use std::time::Duration;

use rdkafka::Offset;
use rdkafka::TopicPartitionList;
use rdkafka::consumer::{BaseConsumer, Consumer};
use tracing::debug;

use crate::config::BrokerConfig;
use crate::error::BrokerError;
use crate::message::DlqMessage;

/// All DLQ topics this tool manages are single-partition; everything reads
/// partition 0.
pub const DLQ_PARTITION: i32 = 0;

const POLL_TIMEOUT: Duration = Duration::from_secs(2);
const WATERMARK_TIMEOUT: Duration = Duration::from_secs(5);
/// Extra poll attempts tolerated beyond one per expected record.
const POLL_SLACK: usize = 10;

/// Offset of the first record on a page, treating offsets as flat row
/// numbers. Page boundaries shift if retention has deleted records below
/// the low watermark; that drift is accepted.
pub fn page_start_offset(page: u64, size: usize) -> i64 {
    (page as i64 - 1) * size as i64
}

/// Read-only access to DLQ partitions.
///
/// Every operation builds a throwaway consumer with a randomized group id,
/// seeks explicitly, and drops the consumer when the call returns. Offsets
/// are never committed, so browsing leaves no trace on the cluster.
#[derive(Debug, Clone)]
pub struct PartitionBrowser {
    config: BrokerConfig,
}

impl PartitionBrowser {
    pub fn new(config: BrokerConfig) -> Self {
        Self { config }
    }

    /// Fetch one page of messages from partition 0 of `topic`.
    ///
    /// `page` is 1-indexed; the caller validates `page >= 1` and
    /// `1 <= size <= 100` before reaching this layer.
    pub async fn fetch_page(
        &self,
        topic: &str,
        page: u64,
        size: usize,
    ) -> Result<Vec<DlqMessage>, BrokerError> {
        let config = self.config.clone();
        let topic = topic.to_owned();
        run_blocking(move || fetch_page_blocking(&config, &topic, page, size)).await
    }

    /// Approximate message count: high watermark minus low watermark of
    /// partition 0. Counts retention-deleted slots as absent but cannot see
    /// transaction markers, so treat it as an estimate.
    pub async fn count(&self, topic: &str) -> Result<i64, BrokerError> {
        let config = self.config.clone();
        let topic = topic.to_owned();
        run_blocking(move || count_blocking(&config, &topic)).await
    }

    /// Read the single record at `partition`/`offset`, or `None` if the
    /// offset is outside the partition's watermarks or no longer holds a
    /// record (compaction, retention).
    pub async fn read_at(
        &self,
        topic: &str,
        partition: i32,
        offset: i64,
    ) -> Result<Option<DlqMessage>, BrokerError> {
        let config = self.config.clone();
        let topic = topic.to_owned();
        run_blocking(move || read_at_blocking(&config, &topic, partition, offset)).await
    }
}

pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, BrokerError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, BrokerError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| BrokerError::Interrupted(e.to_string()))?
}

pub(crate) fn assigned_consumer(
    config: &BrokerConfig,
    topic: &str,
    partition: i32,
    offset: Offset,
) -> Result<BaseConsumer, BrokerError> {
    let consumer: BaseConsumer = config.browse_config().create()?;
    let mut assignment = TopicPartitionList::new();
    assignment.add_partition_offset(topic, partition, offset)?;
    consumer.assign(&assignment)?;
    Ok(consumer)
}

/// Start offset of the page window, or `None` when the page begins at or
/// past the high watermark. Starts below the low watermark are clamped up;
/// seeking below it would trip auto.offset.reset and make the result
/// nondeterministic.
fn page_window(start: i64, low: i64, high: i64) -> Option<i64> {
    if start >= high {
        return None;
    }
    Some(start.max(low))
}

/// Drain up to `size` records from `poll`. Stops at the first empty poll
/// (end of partition) or once the poll budget is spent.
fn drain_page<P>(size: usize, mut poll: P) -> Result<Vec<DlqMessage>, BrokerError>
where
    P: FnMut() -> Option<Result<DlqMessage, BrokerError>>,
{
    let mut messages = Vec::with_capacity(size);
    for _ in 0..size + POLL_SLACK {
        if messages.len() >= size {
            break;
        }
        match poll() {
            Some(Ok(message)) => messages.push(message),
            Some(Err(e)) => return Err(e),
            None => break,
        }
    }
    Ok(messages)
}

fn fetch_page_blocking(
    config: &BrokerConfig,
    topic: &str,
    page: u64,
    size: usize,
) -> Result<Vec<DlqMessage>, BrokerError> {
    let probe: BaseConsumer = config.browse_config().create()?;
    let (low, high) = probe.fetch_watermarks(topic, DLQ_PARTITION, WATERMARK_TIMEOUT)?;
    drop(probe);

    let Some(start) = page_window(page_start_offset(page, size), low, high) else {
        return Ok(Vec::new());
    };

    let consumer = assigned_consumer(config, topic, DLQ_PARTITION, Offset::Offset(start))?;
    let messages = drain_page(size, || match consumer.poll(POLL_TIMEOUT) {
        Some(Ok(record)) => Some(Ok(DlqMessage::from_borrowed(&record))),
        Some(Err(e)) => Some(Err(e.into())),
        None => None,
    })?;

    debug!(topic, page, size, fetched = messages.len(), "fetched DLQ page");
    Ok(messages)
}

fn count_blocking(config: &BrokerConfig, topic: &str) -> Result<i64, BrokerError> {
    let consumer: BaseConsumer = config.browse_config().create()?;
    let (low, high) = consumer.fetch_watermarks(topic, DLQ_PARTITION, WATERMARK_TIMEOUT)?;
    Ok(high - low)
}

fn read_at_blocking(
    config: &BrokerConfig,
    topic: &str,
    partition: i32,
    offset: i64,
) -> Result<Option<DlqMessage>, BrokerError> {
    let probe: BaseConsumer = config.browse_config().create()?;
    let (low, high) = probe.fetch_watermarks(topic, partition, WATERMARK_TIMEOUT)?;
    drop(probe);

    if offset < low || offset >= high {
        return Ok(None);
    }

    let consumer = assigned_consumer(config, topic, partition, Offset::Offset(offset))?;

    // The fetch may start below the target when surrounding records were
    // compacted away; skip forward until the target is reached or passed.
    for _ in 0..POLL_SLACK {
        match consumer.poll(WATERMARK_TIMEOUT) {
            Some(Ok(record)) => {
                let message = DlqMessage::from_borrowed(&record);
                if message.offset == offset {
                    return Ok(Some(message));
                }
                if message.offset > offset {
                    return Ok(None);
                }
            }
            Some(Err(e)) => return Err(e.into()),
            None => return Ok(None),
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageHeaders;

    #[test]
    fn first_page_starts_at_zero() {
        assert_eq!(page_start_offset(1, 10), 0);
    }

    #[test]
    fn later_pages_advance_by_page_size() {
        assert_eq!(page_start_offset(2, 10), 10);
        assert_eq!(page_start_offset(3, 25), 50);
        assert_eq!(page_start_offset(100, 100), 9900);
    }

    #[test]
    fn page_size_one_walks_single_offsets() {
        assert_eq!(page_start_offset(7, 1), 6);
    }

    fn record(offset: i64) -> DlqMessage {
        DlqMessage {
            key: None,
            payload: b"{}".to_vec(),
            partition: DLQ_PARTITION,
            offset,
            timestamp_ms: None,
            headers: MessageHeaders::new(),
        }
    }

    /// Poll closure fed from a fixed record sequence; returns `None` once
    /// exhausted, like an empty poll at the end of a partition.
    fn feed(records: Vec<DlqMessage>) -> impl FnMut() -> Option<Result<DlqMessage, BrokerError>> {
        let mut queue = records.into_iter();
        move || queue.next().map(Ok)
    }

    #[test]
    fn empty_topic_first_page_is_empty_without_error() {
        // low == high == 0 on a topic that never saw a record
        assert_eq!(page_window(page_start_offset(1, 10), 0, 0), None);
    }

    #[test]
    fn page_past_the_high_watermark_is_empty() {
        assert_eq!(page_window(page_start_offset(3, 10), 0, 15), None);
    }

    #[test]
    fn page_start_is_clamped_to_the_low_watermark() {
        assert_eq!(page_window(page_start_offset(1, 10), 5, 30), Some(5));
        assert_eq!(page_window(page_start_offset(2, 10), 5, 30), Some(10));
    }

    #[test]
    fn full_page_stops_at_the_page_size() {
        let page = drain_page(10, feed((0..15).map(record).collect())).unwrap();
        assert_eq!(page.len(), 10);
        assert_eq!(page.last().map(|m| m.offset), Some(9));
    }

    #[test]
    fn short_last_page_returns_what_remains() {
        let page = drain_page(10, feed(vec![record(20), record(21), record(22)])).unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page[0].offset, 20);
    }

    #[test]
    fn immediate_empty_poll_yields_an_empty_page() {
        let page = drain_page(10, feed(Vec::new())).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn poll_error_aborts_the_page() {
        let mut polls: i64 = 0;
        let result = drain_page(10, || {
            polls += 1;
            if polls == 3 {
                Some(Err(BrokerError::Unavailable("broker went away".into())))
            } else {
                Some(Ok(record(polls - 1)))
            }
        });
        assert!(matches!(result, Err(BrokerError::Unavailable(_))));
    }
}
