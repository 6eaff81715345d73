use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A registered DLQ topic and the source topic its messages replay to.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dlq_topic")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Topic holding the dead letters, e.g. `orders-dlq`.
    #[sea_orm(unique)]
    pub dlq_topic_name: String,

    /// Source topic messages are replayed back to, e.g. `orders`.
    pub destination_topic: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(default_value = true)]
    pub active: bool,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
