use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{dlq_topic, replay_job};
use crate::error::AppError;
use crate::models::status::ReplayStatus;

/// Who to record as the initiator when the request does not say.
pub const DEFAULT_INITIATOR: &str = "system";

/// Request to replay a single message.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SingleReplayRequest {
    pub dlq_topic_id: Uuid,
    #[schema(example = 42)]
    pub message_offset: i64,
    #[schema(example = 0)]
    pub message_partition: i32,
    #[schema(example = "alice")]
    pub initiated_by: Option<String>,
}

/// Position of one message within the DLQ topic.
#[derive(Debug, Clone, Copy, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageIdentifier {
    #[schema(example = 42)]
    pub offset: i64,
    #[schema(example = 0)]
    pub partition: i32,
}

/// Request to replay a batch of messages.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkReplayRequest {
    pub dlq_topic_id: Uuid,
    pub messages: Vec<MessageIdentifier>,
    #[schema(example = "alice")]
    pub initiated_by: Option<String>,
}

/// Query parameters for replay history.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct HistoryParams {
    /// Restrict history to one DLQ topic.
    pub dlq: Option<Uuid>,
}

/// A replay job as it appears on the wire, with derived metrics.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplayJobView {
    pub id: Uuid,
    pub dlq_topic_id: Uuid,
    /// Null when the topic registration was deleted after the job ran.
    #[schema(example = "orders-dlq")]
    pub dlq_topic_name: Option<String>,
    #[schema(example = "orders")]
    pub destination_topic: Option<String>,
    #[schema(example = "alice")]
    pub initiated_by: String,
    #[schema(example = "COMPLETED")]
    pub status: String,
    #[schema(example = 10)]
    pub total_messages: i32,
    #[schema(example = 9)]
    pub succeeded: i32,
    #[schema(example = 1)]
    pub failed: i32,
    /// Percentage of successfully replayed messages; null until terminal.
    #[schema(example = 90.0)]
    pub success_rate: Option<f64>,
    /// Wall-clock job duration; null until terminal.
    #[schema(example = 4)]
    pub duration_seconds: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ReplayJobView {
    pub fn from_parts(job: replay_job::Model, topic: Option<&dlq_topic::Model>) -> Self {
        let terminal = job
            .status
            .parse::<ReplayStatus>()
            .map(|s| s.is_terminal())
            .unwrap_or(false);

        let success_rate = if terminal && job.total_messages > 0 {
            Some(f64::from(job.succeeded) * 100.0 / f64::from(job.total_messages))
        } else {
            None
        };

        let duration_seconds = if terminal {
            match (job.started_at, job.completed_at) {
                (Some(started), Some(completed)) => Some((completed - started).num_seconds()),
                _ => None,
            }
        } else {
            None
        };

        Self {
            id: job.id,
            dlq_topic_id: job.dlq_topic_id,
            dlq_topic_name: topic.map(|t| t.dlq_topic_name.clone()),
            destination_topic: topic.map(|t| t.destination_topic.clone()),
            initiated_by: job.initiated_by,
            status: job.status,
            total_messages: job.total_messages,
            succeeded: job.succeeded,
            failed: job.failed,
            success_rate,
            duration_seconds,
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplayJobResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "Message replayed successfully")]
    pub message: String,
    pub replay_job: ReplayJobView,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplayHistoryResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = 3)]
    pub count: usize,
    pub jobs: Vec<ReplayJobView>,
}

pub fn validate_single(req: &SingleReplayRequest) -> Result<(), AppError> {
    if req.message_offset < 0 {
        return Err(AppError::Validation("messageOffset must be >= 0".into()));
    }
    if req.message_partition < 0 {
        return Err(AppError::Validation("messagePartition must be >= 0".into()));
    }
    Ok(())
}

pub fn validate_bulk(req: &BulkReplayRequest) -> Result<(), AppError> {
    if req.messages.is_empty() {
        return Err(AppError::Validation("messages must not be empty".into()));
    }
    for m in &req.messages {
        if m.offset < 0 {
            return Err(AppError::Validation("offset must be >= 0".into()));
        }
        if m.partition < 0 {
            return Err(AppError::Validation("partition must be >= 0".into()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::status::ReplayStatus;

    fn job(status: ReplayStatus) -> replay_job::Model {
        let created = "2026-01-11T10:30:00Z".parse::<DateTime<Utc>>().unwrap();
        replay_job::Model {
            id: Uuid::new_v4(),
            dlq_topic_id: Uuid::new_v4(),
            initiated_by: "alice".into(),
            status: status.as_str().into(),
            total_messages: 10,
            succeeded: 9,
            failed: 1,
            started_at: Some(created),
            completed_at: if status.is_terminal() {
                Some(created + chrono::Duration::seconds(4))
            } else {
                None
            },
            created_at: created,
        }
    }

    #[test]
    fn terminal_job_exposes_derived_metrics() {
        let view = ReplayJobView::from_parts(job(ReplayStatus::Completed), None);
        assert_eq!(view.success_rate, Some(90.0));
        assert_eq!(view.duration_seconds, Some(4));
    }

    #[test]
    fn running_job_has_null_metrics() {
        let view = ReplayJobView::from_parts(job(ReplayStatus::Running), None);
        assert_eq!(view.success_rate, None);
        assert_eq!(view.duration_seconds, None);
    }

    #[test]
    fn topic_names_come_from_the_registration() {
        let now = Utc::now();
        let topic = dlq_topic::Model {
            id: Uuid::new_v4(),
            dlq_topic_name: "orders-dlq".into(),
            destination_topic: "orders".into(),
            description: None,
            active: true,
            created_at: now,
            updated_at: now,
        };

        let view = ReplayJobView::from_parts(job(ReplayStatus::Completed), Some(&topic));
        assert_eq!(view.dlq_topic_name.as_deref(), Some("orders-dlq"));
        assert_eq!(view.destination_topic.as_deref(), Some("orders"));
    }

    #[test]
    fn bulk_requests_must_name_messages() {
        let req = BulkReplayRequest {
            dlq_topic_id: Uuid::new_v4(),
            messages: vec![],
            initiated_by: None,
        };
        assert!(validate_bulk(&req).is_err());
    }

    #[test]
    fn negative_positions_are_rejected() {
        let req = SingleReplayRequest {
            dlq_topic_id: Uuid::new_v4(),
            message_offset: -1,
            message_partition: 0,
            initiated_by: None,
        };
        assert!(validate_single(&req).is_err());

        let req = BulkReplayRequest {
            dlq_topic_id: Uuid::new_v4(),
            messages: vec![MessageIdentifier {
                offset: 3,
                partition: -2,
            }],
            initiated_by: None,
        };
        assert!(validate_bulk(&req).is_err());
    }
}
