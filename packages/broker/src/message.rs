use chrono::{SecondsFormat, Utc};
use rdkafka::Message;
use rdkafka::message::{BorrowedMessage, Headers};

/// Well-known header names written by DLQ-routing consumers.
pub mod headers {
    pub const ERROR_MESSAGE: &str = "X-Error-Message";
    pub const ORIGINAL_TOPIC: &str = "X-Original-Topic";
    pub const RETRY_COUNT: &str = "X-Retry-Count";
    pub const EXCEPTION_CLASS: &str = "X-Exception-Class";
    pub const FAILED_TIMESTAMP: &str = "X-Failed-Timestamp";
    pub const CONSUMER_GROUP: &str = "X-Consumer-Group";
    pub const REPLAYED_AT: &str = "X-Replayed-At";
}

/// Diagnostic headers that must not follow a message back to its source
/// topic. `X-Original-Topic` is deliberately absent: it stays useful for
/// tracing a message's history across replays.
pub const REPLAY_DENYLIST: [&str; 5] = [
    headers::ERROR_MESSAGE,
    headers::RETRY_COUNT,
    headers::EXCEPTION_CLASS,
    headers::FAILED_TIMESTAMP,
    headers::CONSUMER_GROUP,
];

/// Kafka headers as an insertion-ordered list of string pairs.
///
/// Kafka permits duplicate header keys and replays must re-emit headers in
/// their original order, so this is a pair list rather than a map. `get`
/// returns the last value for a key, matching broker read-side semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageHeaders(Vec<(String, String)>);

impl MessageHeaders {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Headers as a JSON object, in insertion order. Duplicate keys collapse
    /// to the last value, same as `get`.
    pub fn to_json(&self) -> serde_json::Map<String, serde_json::Value> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect()
    }
}

impl FromIterator<(String, String)> for MessageHeaders {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One record read from a DLQ partition, decoded for inspection or replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DlqMessage {
    pub key: Option<String>,
    pub payload: Vec<u8>,
    pub partition: i32,
    pub offset: i64,
    /// Broker-assigned record timestamp, epoch millis.
    pub timestamp_ms: Option<i64>,
    pub headers: MessageHeaders,
}

impl DlqMessage {
    pub(crate) fn from_borrowed(msg: &BorrowedMessage<'_>) -> Self {
        let mut headers = MessageHeaders::new();
        if let Some(borrowed) = msg.headers() {
            for header in borrowed.iter() {
                let value = header
                    .value
                    .map(|v| String::from_utf8_lossy(v).into_owned())
                    .unwrap_or_default();
                headers.insert(header.key, value);
            }
        }

        Self {
            key: msg.key().map(|k| String::from_utf8_lossy(k).into_owned()),
            payload: msg.payload().map(|p| p.to_vec()).unwrap_or_default(),
            partition: msg.partition(),
            offset: msg.offset(),
            timestamp_ms: msg.timestamp().to_millis(),
            headers,
        }
    }
}

/// Rewrites DLQ headers for replay back to a source topic.
pub struct HeaderCodec;

impl HeaderCodec {
    /// Strip the diagnostic denylist, keep everything else in order, and
    /// append a fresh `X-Replayed-At` marker (ISO-8601 UTC, taken now).
    /// A marker from an earlier replay is dropped so exactly one is present.
    pub fn sanitize_for_replay(original: &MessageHeaders) -> MessageHeaders {
        let mut cleaned: MessageHeaders = original
            .iter()
            .filter(|(key, _)| !REPLAY_DENYLIST.contains(key) && *key != headers::REPLAYED_AT)
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();

        cleaned.insert(
            headers::REPLAYED_AT,
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        cleaned
    }
}
