use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-message audit record of a replay attempt. Insert-only ledger.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "replay_message")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(indexed)]
    pub replay_job_id: Uuid,

    pub message_key: Option<String>,

    /// Where the message sat in the DLQ partition.
    pub dlq_offset: i64,

    pub dlq_partition: i32,

    /// SUCCESS or FAILED.
    #[sea_orm(indexed)]
    pub status: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,

    pub replayed_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
