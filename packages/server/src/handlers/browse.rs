use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;
use uuid::Uuid;

use crate::entity::dlq_topic;
use crate::error::{AppError, ErrorBody};
use crate::models::browse::*;
use crate::registry::DlqRegistry;
use crate::state::AppState;

async fn resolve_topic(state: &AppState, id: Uuid) -> Result<dlq_topic::Model, AppError> {
    let registry = DlqRegistry::new(&state.db);
    registry
        .resolve(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("DLQ topic not found: {id}")))
}

/// Browse messages in a DLQ topic.
#[utoipa::path(
    get,
    path = "/{id}/messages",
    tag = "Browse",
    operation_id = "browseDlqMessages",
    summary = "Browse messages in a DLQ topic",
    description = "Reads one page from partition 0 of the DLQ topic without \
                   consuming anything: offsets are never committed and \
                   repeated reads return the same messages.",
    params(("id" = Uuid, Path, description = "DLQ topic id"), BrowseParams),
    responses(
        (status = 200, description = "One page of messages", body = BrowseResponse),
        (status = 400, description = "Bad pagination parameters", body = ErrorBody),
        (status = 404, description = "Unknown DLQ topic id", body = ErrorBody),
        (status = 500, description = "Broker unavailable", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(%id))]
pub async fn browse_messages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<BrowseParams>,
) -> Result<Json<BrowseResponse>, AppError> {
    let page = params.page.unwrap_or(1);
    let size = params.size.unwrap_or(DEFAULT_PAGE_SIZE);
    // Request shape is checked before any lookup.
    validate_pagination(page, size)?;

    let topic = resolve_topic(&state, id).await?;

    let messages = state
        .browser
        .fetch_page(&topic.dlq_topic_name, page, size)
        .await?;
    let total = state.browser.count(&topic.dlq_topic_name).await?;

    Ok(Json(BrowseResponse {
        success: true,
        messages: messages.into_iter().map(Into::into).collect(),
        pagination: PaginationMeta::new(page, size, total),
    }))
}

/// Count messages in a DLQ topic.
#[utoipa::path(
    get,
    path = "/{id}/message-count",
    tag = "Browse",
    operation_id = "getDlqMessageCount",
    summary = "Count messages in a DLQ topic",
    description = "High watermark minus low watermark of partition 0. An \
                   approximation: retention and transaction markers can \
                   make it differ from the number of fetchable records.",
    params(("id" = Uuid, Path, description = "DLQ topic id")),
    responses(
        (status = 200, description = "Approximate message count", body = MessageCountResponse),
        (status = 404, description = "Unknown DLQ topic id", body = ErrorBody),
        (status = 500, description = "Broker unavailable", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(%id))]
pub async fn message_count(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageCountResponse>, AppError> {
    let topic = resolve_topic(&state, id).await?;
    let total = state.browser.count(&topic.dlq_topic_name).await?;

    Ok(Json(MessageCountResponse {
        success: true,
        dlq_topic_name: topic.dlq_topic_name,
        total_messages: total,
    }))
}

/// Aggregate a DLQ topic by error cause.
#[utoipa::path(
    get,
    path = "/{id}/error-breakdown",
    tag = "Browse",
    operation_id = "getDlqErrorBreakdown",
    summary = "Aggregate a DLQ topic by error cause",
    description = "Scans the whole partition and groups messages by their \
                   X-Error-Message header, sorted by count descending. \
                   Runtime is linear in partition size.",
    params(("id" = Uuid, Path, description = "DLQ topic id")),
    responses(
        (status = 200, description = "Error breakdown", body = ErrorBreakdownResponse),
        (status = 404, description = "Unknown DLQ topic id", body = ErrorBody),
        (status = 500, description = "Broker unavailable", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(%id))]
pub async fn error_breakdown(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ErrorBreakdownResponse>, AppError> {
    let topic = resolve_topic(&state, id).await?;
    let (total, entries) = state.analyzer.breakdown(&topic.dlq_topic_name).await?;

    Ok(Json(ErrorBreakdownResponse {
        success: true,
        dlq_topic_name: topic.dlq_topic_name,
        total_messages: total,
        error_breakdown: entries.into_iter().map(Into::into).collect(),
    }))
}
