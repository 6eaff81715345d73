use broker::message::headers;
use broker::{DlqMessage, ErrorBreakdownEntry};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const MAX_PAGE_SIZE: usize = 100;
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Query parameters for browsing a DLQ topic.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct BrowseParams {
    /// Page number (1-indexed).
    #[param(example = 1)]
    pub page: Option<u64>,
    /// Messages per page (1-100, default 10).
    #[param(example = 10)]
    pub size: Option<usize>,
}

pub fn validate_pagination(page: u64, size: usize) -> Result<(), AppError> {
    if page < 1 {
        return Err(AppError::Validation("page must be >= 1".into()));
    }
    if size < 1 || size > MAX_PAGE_SIZE {
        return Err(AppError::Validation(format!(
            "size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok(())
}

/// One DLQ message as it appears on the wire, with diagnostic headers
/// lifted into their own fields.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DlqMessageView {
    #[schema(example = "ORD-78900")]
    pub message_key: Option<String>,
    /// Decoded payload: a JSON value when the bytes parse as JSON,
    /// otherwise the raw text as a JSON string.
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    #[schema(example = 0)]
    pub partition: i32,
    #[schema(example = 42)]
    pub offset: i64,
    /// Broker record timestamp, ISO-8601.
    #[schema(example = "2026-01-11T10:30:00Z")]
    pub timestamp: Option<String>,
    #[schema(example = "DB Connection Timeout")]
    pub error_message: Option<String>,
    #[schema(example = "orders")]
    pub original_topic: Option<String>,
    #[schema(example = 3)]
    pub retry_count: Option<i32>,
    /// When the message landed in the DLQ, ISO-8601.
    pub failed_timestamp: Option<String>,
    #[schema(example = "orders-processor")]
    pub consumer_group: Option<String>,
    /// Every header on the record, for debugging.
    #[schema(value_type = Object)]
    pub headers: serde_json::Map<String, serde_json::Value>,
}

impl From<DlqMessage> for DlqMessageView {
    fn from(m: DlqMessage) -> Self {
        let retry_count = m
            .headers
            .get(headers::RETRY_COUNT)
            .and_then(|v| v.parse::<i32>().ok());
        let failed_timestamp = m
            .headers
            .get(headers::FAILED_TIMESTAMP)
            .and_then(|v| v.parse::<i64>().ok())
            .and_then(format_epoch_millis);

        Self {
            message_key: m.key,
            payload: payload_to_json(&m.payload),
            partition: m.partition,
            offset: m.offset,
            timestamp: m.timestamp_ms.and_then(format_epoch_millis),
            error_message: m.headers.get(headers::ERROR_MESSAGE).map(str::to_owned),
            original_topic: m.headers.get(headers::ORIGINAL_TOPIC).map(str::to_owned),
            retry_count,
            failed_timestamp,
            consumer_group: m.headers.get(headers::CONSUMER_GROUP).map(str::to_owned),
            headers: m.headers.to_json(),
        }
    }
}

fn format_epoch_millis(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Decode payload bytes: JSON value when parseable, raw string otherwise.
pub fn payload_to_json(payload: &[u8]) -> serde_json::Value {
    serde_json::from_slice(payload)
        .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(payload).into_owned()))
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    #[schema(example = 1)]
    pub current_page: u64,
    #[schema(example = 10)]
    pub page_size: usize,
    /// Approximate (watermark-based) total for the whole partition.
    #[schema(example = 57)]
    pub total_messages: i64,
    #[schema(example = 6)]
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PaginationMeta {
    pub fn new(current_page: u64, page_size: usize, total_messages: i64) -> Self {
        let total_pages = (total_messages.max(0) as u64).div_ceil(page_size as u64);
        Self {
            current_page,
            page_size,
            total_messages,
            total_pages,
            has_next_page: current_page < total_pages,
            has_previous_page: current_page > 1,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BrowseResponse {
    #[schema(example = true)]
    pub success: bool,
    pub messages: Vec<DlqMessageView>,
    pub pagination: PaginationMeta,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageCountResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "orders-dlq")]
    pub dlq_topic_name: String,
    #[schema(example = 57)]
    pub total_messages: i64,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBreakdownItem {
    #[schema(example = "DB Connection Timeout")]
    pub error_type: String,
    #[schema(example = 12)]
    pub count: u64,
    #[schema(example = 48.0)]
    pub percentage: f64,
}

impl From<ErrorBreakdownEntry> for ErrorBreakdownItem {
    fn from(e: ErrorBreakdownEntry) -> Self {
        Self {
            error_type: e.error_type,
            count: e.count,
            percentage: e.percentage,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBreakdownResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "orders-dlq")]
    pub dlq_topic_name: String,
    /// Messages scanned; equals the sum of all breakdown counts.
    #[schema(example = 25)]
    pub total_messages: u64,
    pub error_breakdown: Vec<ErrorBreakdownItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    use broker::MessageHeaders;

    fn sample_message() -> DlqMessage {
        let mut h = MessageHeaders::new();
        h.insert(headers::ERROR_MESSAGE, "DB Connection Timeout");
        h.insert(headers::ORIGINAL_TOPIC, "orders");
        h.insert(headers::RETRY_COUNT, "3");
        h.insert(headers::FAILED_TIMESTAMP, "1767100000000");
        h.insert(headers::CONSUMER_GROUP, "orders-processor");
        DlqMessage {
            key: Some("ORD-78900".into()),
            payload: br#"{"orderId":"ORD-78900","amount":12.5}"#.to_vec(),
            partition: 0,
            offset: 42,
            timestamp_ms: Some(1767100000000),
            headers: h,
        }
    }

    #[test]
    fn view_lifts_diagnostic_headers() {
        let view = DlqMessageView::from(sample_message());

        assert_eq!(view.error_message.as_deref(), Some("DB Connection Timeout"));
        assert_eq!(view.original_topic.as_deref(), Some("orders"));
        assert_eq!(view.retry_count, Some(3));
        assert_eq!(view.consumer_group.as_deref(), Some("orders-processor"));
        assert!(view.failed_timestamp.unwrap().starts_with("2025-12-30T"));
    }

    #[test]
    fn view_parses_json_payload() {
        let view = DlqMessageView::from(sample_message());
        assert_eq!(view.payload["orderId"], "ORD-78900");
    }

    #[test]
    fn non_json_payload_becomes_string() {
        let mut message = sample_message();
        message.payload = b"plain text, not json".to_vec();

        let view = DlqMessageView::from(message);
        assert_eq!(
            view.payload,
            serde_json::Value::String("plain text, not json".into())
        );
    }

    #[test]
    fn unparseable_retry_count_is_dropped() {
        let mut message = sample_message();
        message.headers.insert(headers::RETRY_COUNT, "many");

        let view = DlqMessageView::from(message);
        assert_eq!(view.retry_count, None);
    }

    #[test]
    fn pagination_rejects_out_of_range_values() {
        assert!(validate_pagination(0, 10).is_err());
        assert!(validate_pagination(1, 0).is_err());
        assert!(validate_pagination(1, 101).is_err());
        assert!(validate_pagination(1, 1).is_ok());
        assert!(validate_pagination(1, 100).is_ok());
    }

    #[test]
    fn pagination_meta_rounds_pages_up() {
        let meta = PaginationMeta::new(1, 10, 57);
        assert_eq!(meta.total_pages, 6);
        assert!(meta.has_next_page);
        assert!(!meta.has_previous_page);

        let last = PaginationMeta::new(6, 10, 57);
        assert!(!last.has_next_page);
        assert!(last.has_previous_page);
    }

    #[test]
    fn pagination_meta_for_empty_topic() {
        let meta = PaginationMeta::new(1, 10, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
        assert!(!meta.has_previous_page);
    }
}
