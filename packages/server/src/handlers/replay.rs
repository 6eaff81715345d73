use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::audit::JobAuditStore;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::replay::*;
use crate::registry::DlqRegistry;
use crate::replay::{AttemptError, ReplayOrchestrator};
use crate::state::AppState;

fn map_attempt_error(error: AttemptError) -> AppError {
    match error {
        AttemptError::NotFound { .. } => AppError::NotFound(error.to_string()),
        AttemptError::Broker(e) => e.into(),
    }
}

/// Replay one message from a DLQ topic.
#[utoipa::path(
    post,
    path = "/single",
    tag = "Replay",
    operation_id = "replaySingleMessage",
    summary = "Replay one message",
    description = "Reads the message at the given partition/offset and \
                   re-sends it to the registered destination topic with \
                   diagnostic headers stripped. The attempt is audited even \
                   when it fails; a failure then surfaces as the error \
                   response after the FAILED job has been recorded.",
    request_body = SingleReplayRequest,
    responses(
        (status = 200, description = "Message replayed", body = ReplayJobResponse),
        (status = 400, description = "Negative offset or partition", body = ErrorBody),
        (status = 404, description = "Unknown topic or no message at the offset", body = ErrorBody),
        (status = 500, description = "Send failed", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn replay_single(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SingleReplayRequest>,
) -> Result<Json<ReplayJobResponse>, AppError> {
    validate_single(&payload)?;

    let registry = DlqRegistry::new(&state.db);
    let topic = registry
        .resolve(payload.dlq_topic_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("DLQ topic not found: {}", payload.dlq_topic_id)))?;

    let initiated_by = payload.initiated_by.as_deref().unwrap_or(DEFAULT_INITIATOR);

    let audit = JobAuditStore::new(&state.db);
    let orchestrator = ReplayOrchestrator::new(&audit, &*state.browser, &*state.producer);
    let result = orchestrator
        .replay_single(
            &topic,
            payload.message_partition,
            payload.message_offset,
            initiated_by,
        )
        .await?;

    match result.failure {
        None => Ok(Json(ReplayJobResponse {
            success: true,
            message: "Message replayed successfully".into(),
            replay_job: ReplayJobView::from_parts(result.job, Some(&topic)),
        })),
        // The FAILED job and its audit record are already committed.
        Some(error) => Err(map_attempt_error(error)),
    }
}

/// Replay a batch of messages from a DLQ topic.
#[utoipa::path(
    post,
    path = "/bulk",
    tag = "Replay",
    operation_id = "replayBulkMessages",
    summary = "Replay a batch of messages",
    description = "Replays the listed messages sequentially. Per-message \
                   failures are recorded in the audit ledger and do not \
                   stop the batch; the job completes once every message \
                   has been attempted.",
    request_body = BulkReplayRequest,
    responses(
        (status = 200, description = "Batch finished", body = ReplayJobResponse),
        (status = 400, description = "Empty batch or negative positions", body = ErrorBody),
        (status = 404, description = "Unknown DLQ topic id", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn replay_bulk(
    State(state): State<AppState>,
    AppJson(payload): AppJson<BulkReplayRequest>,
) -> Result<Json<ReplayJobResponse>, AppError> {
    validate_bulk(&payload)?;

    let registry = DlqRegistry::new(&state.db);
    let topic = registry
        .resolve(payload.dlq_topic_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("DLQ topic not found: {}", payload.dlq_topic_id)))?;

    let initiated_by = payload.initiated_by.as_deref().unwrap_or(DEFAULT_INITIATOR);
    let positions: Vec<(i32, i64)> = payload
        .messages
        .iter()
        .map(|m| (m.partition, m.offset))
        .collect();

    let audit = JobAuditStore::new(&state.db);
    let orchestrator = ReplayOrchestrator::new(&audit, &*state.browser, &*state.producer);
    let job = orchestrator
        .replay_bulk(&topic, &positions, initiated_by)
        .await?;

    info!(job_id = %job.id, total = job.total_messages, "bulk replay job finished");
    Ok(Json(ReplayJobResponse {
        success: true,
        message: format!(
            "Bulk replay finished: {} succeeded, {} failed",
            job.succeeded, job.failed
        ),
        replay_job: ReplayJobView::from_parts(job, Some(&topic)),
    }))
}

/// Get a replay job.
#[utoipa::path(
    get,
    path = "/jobs/{id}",
    tag = "Replay",
    operation_id = "getReplayJob",
    summary = "Get a replay job",
    params(("id" = Uuid, Path, description = "Replay job id")),
    responses(
        (status = 200, description = "The replay job", body = ReplayJobResponse),
        (status = 404, description = "Unknown job id", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(%id))]
pub async fn get_replay_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReplayJobResponse>, AppError> {
    let audit = JobAuditStore::new(&state.db);
    let job = audit
        .get_job(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Replay job not found: {id}")))?;

    let registry = DlqRegistry::new(&state.db);
    let topic = registry.resolve(job.dlq_topic_id).await?;

    Ok(Json(ReplayJobResponse {
        success: true,
        message: format!("Job is {}", job.status),
        replay_job: ReplayJobView::from_parts(job, topic.as_ref()),
    }))
}

/// List replay jobs, newest first.
#[utoipa::path(
    get,
    path = "/history",
    tag = "Replay",
    operation_id = "getReplayHistory",
    summary = "List replay jobs, newest first",
    params(HistoryParams),
    responses(
        (status = 200, description = "Replay jobs", body = ReplayHistoryResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn replay_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<ReplayHistoryResponse>, AppError> {
    let audit = JobAuditStore::new(&state.db);
    let jobs = audit.list_jobs(params.dlq).await?;

    let registry = DlqRegistry::new(&state.db);
    let topics = registry
        .resolve_many(jobs.iter().map(|j| j.dlq_topic_id))
        .await?;

    let views: Vec<ReplayJobView> = jobs
        .into_iter()
        .map(|job| {
            let topic = topics.get(&job.dlq_topic_id);
            ReplayJobView::from_parts(job, topic)
        })
        .collect();

    Ok(Json(ReplayHistoryResponse {
        success: true,
        count: views.len(),
        jobs: views,
    }))
}
