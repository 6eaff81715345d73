use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::topic::*;
use crate::registry::{DlqRegistry, RegisterResult, propose_dlq_topics};
use crate::state::AppState;

/// List registered DLQ topics.
#[utoipa::path(
    get,
    path = "",
    tag = "DLQ Topics",
    operation_id = "listDlqTopics",
    summary = "List registered DLQ topics",
    responses(
        (status = 200, description = "Registered DLQ topics", body = DlqTopicListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_dlq_topics(
    State(state): State<AppState>,
) -> Result<Json<DlqTopicListResponse>, AppError> {
    let registry = DlqRegistry::new(&state.db);
    let topics: Vec<DlqTopicView> = registry.list().await?.into_iter().map(Into::into).collect();

    Ok(Json(DlqTopicListResponse {
        success: true,
        count: topics.len(),
        dlq_topics: topics,
    }))
}

/// Register a DLQ topic.
#[utoipa::path(
    post,
    path = "",
    tag = "DLQ Topics",
    operation_id = "registerDlqTopic",
    summary = "Register a DLQ topic",
    request_body = RegisterDlqTopicRequest,
    responses(
        (status = 201, description = "Topic registered", body = DlqTopicResponse),
        (status = 400, description = "Blank topic names", body = ErrorBody),
        (status = 409, description = "DLQ topic name already registered", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn register_dlq_topic(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterDlqTopicRequest>,
) -> Result<(StatusCode, Json<DlqTopicResponse>), AppError> {
    validate_register(&payload)?;

    let registry = DlqRegistry::new(&state.db);
    let result = registry
        .register(
            payload.dlq_topic_name.trim().to_owned(),
            payload.destination_topic.trim().to_owned(),
            payload.description,
        )
        .await?;

    match result {
        RegisterResult::Created(topic) => {
            info!(dlq_topic = %topic.dlq_topic_name, "DLQ topic registered");
            Ok((
                StatusCode::CREATED,
                Json(DlqTopicResponse {
                    success: true,
                    dlq_topic: topic.into(),
                }),
            ))
        }
        RegisterResult::DuplicateName => Err(AppError::Conflict(format!(
            "DLQ topic '{}' is already registered",
            payload.dlq_topic_name.trim()
        ))),
    }
}

/// Discover DLQ topics on the cluster.
#[utoipa::path(
    get,
    path = "/discover",
    tag = "DLQ Topics",
    operation_id = "discoverDlqTopics",
    summary = "Discover DLQ topics on the cluster",
    description = "Matches cluster topics against DLQ naming conventions \
                   (-dlq, -dead-letter, -error, .DLQ, _dlq) and proposes \
                   registrations. Read-only; nothing is registered.",
    responses(
        (status = 200, description = "Proposed DLQ topics", body = DiscoveryResponse),
        (status = 500, description = "Cluster metadata unavailable", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn discover_dlq_topics(
    State(state): State<AppState>,
) -> Result<Json<DiscoveryResponse>, AppError> {
    let cluster_topics = state.admin.list_topic_names().await?;

    let registry = DlqRegistry::new(&state.db);
    let registered = registry.registered_names().await?;

    let discovered = propose_dlq_topics(&cluster_topics, &registered);
    Ok(Json(DiscoveryResponse {
        success: true,
        count: discovered.len(),
        discovered,
    }))
}

/// Get one registered DLQ topic.
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "DLQ Topics",
    operation_id = "getDlqTopic",
    summary = "Get a registered DLQ topic",
    params(("id" = Uuid, Path, description = "DLQ topic id")),
    responses(
        (status = 200, description = "The DLQ topic", body = DlqTopicResponse),
        (status = 404, description = "Unknown DLQ topic id", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(%id))]
pub async fn get_dlq_topic(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DlqTopicResponse>, AppError> {
    let registry = DlqRegistry::new(&state.db);
    let topic = registry
        .resolve(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("DLQ topic not found: {id}")))?;

    Ok(Json(DlqTopicResponse {
        success: true,
        dlq_topic: topic.into(),
    }))
}

/// Update a registered DLQ topic.
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "DLQ Topics",
    operation_id = "updateDlqTopic",
    summary = "Update a registered DLQ topic",
    params(("id" = Uuid, Path, description = "DLQ topic id")),
    request_body = UpdateDlqTopicRequest,
    responses(
        (status = 200, description = "Updated topic", body = DlqTopicResponse),
        (status = 400, description = "Blank destination topic", body = ErrorBody),
        (status = 404, description = "Unknown DLQ topic id", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(%id))]
pub async fn update_dlq_topic(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateDlqTopicRequest>,
) -> Result<Json<DlqTopicResponse>, AppError> {
    validate_update(&payload)?;

    let registry = DlqRegistry::new(&state.db);
    let topic = registry
        .update(
            id,
            payload.destination_topic.map(|d| d.trim().to_owned()),
            payload.description,
            payload.active,
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("DLQ topic not found: {id}")))?;

    info!(dlq_topic = %topic.dlq_topic_name, "DLQ topic updated");
    Ok(Json(DlqTopicResponse {
        success: true,
        dlq_topic: topic.into(),
    }))
}

/// Unregister a DLQ topic.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "DLQ Topics",
    operation_id = "deleteDlqTopic",
    summary = "Unregister a DLQ topic",
    description = "Removes the registration only. The Kafka topic and past \
                   replay jobs are untouched.",
    params(("id" = Uuid, Path, description = "DLQ topic id")),
    responses(
        (status = 200, description = "Topic unregistered", body = DeleteDlqTopicResponse),
        (status = 404, description = "Unknown DLQ topic id", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(%id))]
pub async fn delete_dlq_topic(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteDlqTopicResponse>, AppError> {
    let registry = DlqRegistry::new(&state.db);
    if !registry.delete(id).await? {
        return Err(AppError::NotFound(format!("DLQ topic not found: {id}")));
    }

    info!(%id, "DLQ topic unregistered");
    Ok(Json(DeleteDlqTopicResponse {
        success: true,
        message: "DLQ topic unregistered".into(),
    }))
}
