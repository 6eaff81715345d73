use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One replay operation (single message or bulk batch).
///
/// Lifecycle: PENDING -> RUNNING -> COMPLETED | FAILED. Rows are never
/// mutated again once a terminal status and `completed_at` are written.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "replay_job")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(indexed)]
    pub dlq_topic_id: Uuid,

    pub initiated_by: String,

    /// One of PENDING, RUNNING, COMPLETED, FAILED.
    #[sea_orm(indexed)]
    pub status: String,

    pub total_messages: i32,

    pub succeeded: i32,

    pub failed: i32,

    pub started_at: Option<DateTimeUtc>,

    pub completed_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
