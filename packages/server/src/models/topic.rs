use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::dlq_topic;
use crate::error::AppError;

/// Request to register a DLQ topic.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDlqTopicRequest {
    /// Topic holding the dead letters.
    #[schema(example = "orders-dlq")]
    pub dlq_topic_name: String,
    /// Source topic messages replay back to.
    #[schema(example = "orders")]
    pub destination_topic: String,
    #[schema(example = "Failed order events")]
    pub description: Option<String>,
}

/// Request to update a registered DLQ topic. Absent fields are left as-is.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDlqTopicRequest {
    #[schema(example = "orders-v2")]
    pub destination_topic: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

/// A registered DLQ topic.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DlqTopicView {
    pub id: Uuid,
    #[schema(example = "orders-dlq")]
    pub dlq_topic_name: String,
    #[schema(example = "orders")]
    pub destination_topic: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<dlq_topic::Model> for DlqTopicView {
    fn from(m: dlq_topic::Model) -> Self {
        Self {
            id: m.id,
            dlq_topic_name: m.dlq_topic_name,
            destination_topic: m.destination_topic,
            description: m.description,
            active: m.active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DlqTopicListResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = 2)]
    pub count: usize,
    pub dlq_topics: Vec<DlqTopicView>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DlqTopicResponse {
    #[schema(example = true)]
    pub success: bool,
    pub dlq_topic: DlqTopicView,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDlqTopicResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "DLQ topic unregistered")]
    pub message: String,
}

/// A cluster topic whose name matches a DLQ naming convention.
#[derive(Debug, Serialize, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredTopic {
    #[schema(example = "payments-dlq")]
    pub dlq_topic_name: String,
    /// Suffix-stripped guess at the source topic.
    #[schema(example = "payments")]
    pub guessed_destination: String,
    pub already_registered: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = 1)]
    pub count: usize,
    pub discovered: Vec<DiscoveredTopic>,
}

pub fn validate_register(req: &RegisterDlqTopicRequest) -> Result<(), AppError> {
    if req.dlq_topic_name.trim().is_empty() {
        return Err(AppError::Validation("dlqTopicName must not be blank".into()));
    }
    if req.destination_topic.trim().is_empty() {
        return Err(AppError::Validation(
            "destinationTopic must not be blank".into(),
        ));
    }
    Ok(())
}

pub fn validate_update(req: &UpdateDlqTopicRequest) -> Result<(), AppError> {
    if let Some(dest) = &req.destination_topic
        && dest.trim().is_empty()
    {
        return Err(AppError::Validation(
            "destinationTopic must not be blank".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rejects_blank_names() {
        let req = RegisterDlqTopicRequest {
            dlq_topic_name: "   ".into(),
            destination_topic: "orders".into(),
            description: None,
        };
        assert!(validate_register(&req).is_err());

        let req = RegisterDlqTopicRequest {
            dlq_topic_name: "orders-dlq".into(),
            destination_topic: "".into(),
            description: None,
        };
        assert!(validate_register(&req).is_err());
    }

    #[test]
    fn update_allows_partial_requests() {
        let req = UpdateDlqTopicRequest {
            destination_topic: None,
            description: None,
            active: Some(false),
        };
        assert!(validate_update(&req).is_ok());
    }
}
