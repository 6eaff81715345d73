use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

use crate::entity::{replay_job, replay_message};
use crate::models::status::{ReplayMessageStatus, ReplayStatus};

/// Write side of the replay audit trail.
///
/// A trait so the orchestrator can be exercised without a database; the
/// production implementation is [`JobAuditStore`].
#[async_trait]
pub trait JobAudit: Send + Sync {
    /// Create a job in PENDING state.
    async fn create_job(
        &self,
        dlq_topic_id: Uuid,
        initiated_by: &str,
        total_messages: i32,
    ) -> Result<replay_job::Model, DbErr>;

    /// Transition PENDING -> RUNNING and stamp `started_at`.
    async fn mark_running(&self, job: replay_job::Model) -> Result<replay_job::Model, DbErr>;

    /// Transition to a terminal status with final counters and
    /// `completed_at`. The row is never written again after this.
    async fn finish_job(
        &self,
        job: replay_job::Model,
        succeeded: i32,
        failed: i32,
        status: ReplayStatus,
    ) -> Result<replay_job::Model, DbErr>;

    /// Append one per-message record to the ledger.
    async fn record_message(
        &self,
        replay_job_id: Uuid,
        message_key: Option<String>,
        dlq_offset: i64,
        dlq_partition: i32,
        status: ReplayMessageStatus,
        error_message: Option<String>,
    ) -> Result<(), DbErr>;
}

pub struct JobAuditStore<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> JobAuditStore<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn get_job(&self, id: Uuid) -> Result<Option<replay_job::Model>, DbErr> {
        replay_job::Entity::find_by_id(id).one(self.conn).await
    }

    /// Jobs newest-first, optionally narrowed to one DLQ topic.
    pub async fn list_jobs(
        &self,
        dlq_topic_id: Option<Uuid>,
    ) -> Result<Vec<replay_job::Model>, DbErr> {
        let mut query = replay_job::Entity::find();
        if let Some(topic_id) = dlq_topic_id {
            query = query.filter(replay_job::Column::DlqTopicId.eq(topic_id));
        }
        query
            .order_by_desc(replay_job::Column::CreatedAt)
            .all(self.conn)
            .await
    }
}

#[async_trait]
impl<C: ConnectionTrait> JobAudit for JobAuditStore<'_, C> {
    async fn create_job(
        &self,
        dlq_topic_id: Uuid,
        initiated_by: &str,
        total_messages: i32,
    ) -> Result<replay_job::Model, DbErr> {
        let model = replay_job::ActiveModel {
            id: Set(Uuid::new_v4()),
            dlq_topic_id: Set(dlq_topic_id),
            initiated_by: Set(initiated_by.to_owned()),
            status: Set(ReplayStatus::Pending.to_string()),
            total_messages: Set(total_messages),
            succeeded: Set(0),
            failed: Set(0),
            started_at: Set(None),
            completed_at: Set(None),
            created_at: Set(Utc::now()),
        };
        model.insert(self.conn).await
    }

    async fn mark_running(&self, job: replay_job::Model) -> Result<replay_job::Model, DbErr> {
        let mut model: replay_job::ActiveModel = job.into();
        model.status = Set(ReplayStatus::Running.to_string());
        model.started_at = Set(Some(Utc::now()));
        model.update(self.conn).await
    }

    async fn finish_job(
        &self,
        job: replay_job::Model,
        succeeded: i32,
        failed: i32,
        status: ReplayStatus,
    ) -> Result<replay_job::Model, DbErr> {
        let mut model: replay_job::ActiveModel = job.into();
        model.status = Set(status.to_string());
        model.succeeded = Set(succeeded);
        model.failed = Set(failed);
        model.completed_at = Set(Some(Utc::now()));
        model.update(self.conn).await
    }

    async fn record_message(
        &self,
        replay_job_id: Uuid,
        message_key: Option<String>,
        dlq_offset: i64,
        dlq_partition: i32,
        status: ReplayMessageStatus,
        error_message: Option<String>,
    ) -> Result<(), DbErr> {
        let model = replay_message::ActiveModel {
            id: Set(Uuid::new_v4()),
            replay_job_id: Set(replay_job_id),
            message_key: Set(message_key),
            dlq_offset: Set(dlq_offset),
            dlq_partition: Set(dlq_partition),
            status: Set(status.to_string()),
            error_message: Set(error_message),
            replayed_at: Set(Utc::now()),
        };
        model.insert(self.conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use sea_orm::{DatabaseBackend, MockDatabase};

    fn job_row(id: Uuid, topic_id: Uuid, status: ReplayStatus) -> replay_job::Model {
        replay_job::Model {
            id,
            dlq_topic_id: topic_id,
            initiated_by: "system".into(),
            status: status.to_string(),
            total_messages: 3,
            succeeded: 2,
            failed: 1,
            started_at: Some(Utc::now()),
            completed_at: Some(Utc::now()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn get_job_returns_the_matching_row() {
        let id = Uuid::new_v4();
        let row = job_row(id, Uuid::new_v4(), ReplayStatus::Completed);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row.clone()]])
            .into_connection();

        let store = JobAuditStore::new(&db);
        let found = store.get_job(id).await.unwrap();
        assert_eq!(found, Some(row));
    }

    #[tokio::test]
    async fn get_job_misses_cleanly() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<replay_job::Model>::new()])
            .into_connection();

        let store = JobAuditStore::new(&db);
        assert_eq!(store.get_job(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_jobs_passes_rows_through_in_query_order() {
        let topic_id = Uuid::new_v4();
        let newer = job_row(Uuid::new_v4(), topic_id, ReplayStatus::Completed);
        let older = job_row(Uuid::new_v4(), topic_id, ReplayStatus::Failed);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![newer.clone(), older.clone()]])
            .into_connection();

        let store = JobAuditStore::new(&db);
        let jobs = store.list_jobs(Some(topic_id)).await.unwrap();
        assert_eq!(jobs, vec![newer, older]);
    }
}
