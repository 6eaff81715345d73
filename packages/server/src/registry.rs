use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

use crate::entity::dlq_topic;
use crate::models::topic::DiscoveredTopic;

/// Naming conventions matched by topic discovery.
pub const DLQ_SUFFIXES: [&str; 5] = ["-dlq", "-dead-letter", "-error", ".DLQ", "_dlq"];

/// Result of attempting to register a DLQ topic.
#[derive(Debug)]
pub enum RegisterResult {
    Created(dlq_topic::Model),
    /// A registration with the same DLQ topic name already exists.
    DuplicateName,
}

/// The registered mapping from DLQ topics to their source topics.
///
/// Every browse and replay request resolves its topic here before any
/// broker call is made.
pub struct DlqRegistry<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> DlqRegistry<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn resolve(&self, id: Uuid) -> Result<Option<dlq_topic::Model>, DbErr> {
        dlq_topic::Entity::find_by_id(id).one(self.conn).await
    }

    pub async fn list(&self) -> Result<Vec<dlq_topic::Model>, DbErr> {
        dlq_topic::Entity::find()
            .order_by_asc(dlq_topic::Column::DlqTopicName)
            .all(self.conn)
            .await
    }

    pub async fn register(
        &self,
        dlq_topic_name: String,
        destination_topic: String,
        description: Option<String>,
    ) -> Result<RegisterResult, DbErr> {
        let existing = dlq_topic::Entity::find()
            .filter(dlq_topic::Column::DlqTopicName.eq(dlq_topic_name.as_str()))
            .one(self.conn)
            .await?;
        if existing.is_some() {
            return Ok(RegisterResult::DuplicateName);
        }

        let now = Utc::now();
        let model = dlq_topic::ActiveModel {
            id: Set(Uuid::new_v4()),
            dlq_topic_name: Set(dlq_topic_name),
            destination_topic: Set(destination_topic),
            description: Set(description),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(RegisterResult::Created(model.insert(self.conn).await?))
    }

    pub async fn update(
        &self,
        id: Uuid,
        destination_topic: Option<String>,
        description: Option<String>,
        active: Option<bool>,
    ) -> Result<Option<dlq_topic::Model>, DbErr> {
        let Some(existing) = self.resolve(id).await? else {
            return Ok(None);
        };

        let mut model: dlq_topic::ActiveModel = existing.into();
        if let Some(dest) = destination_topic {
            model.destination_topic = Set(dest);
        }
        if let Some(desc) = description {
            model.description = Set(Some(desc));
        }
        if let Some(active) = active {
            model.active = Set(active);
        }
        model.updated_at = Set(Utc::now());

        Ok(Some(model.update(self.conn).await?))
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, DbErr> {
        let result = dlq_topic::Entity::delete_by_id(id).exec(self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    /// Batch lookup, keyed by id. Missing ids are simply absent.
    pub async fn resolve_many(
        &self,
        ids: impl IntoIterator<Item = Uuid>,
    ) -> Result<HashMap<Uuid, dlq_topic::Model>, DbErr> {
        let ids: Vec<Uuid> = ids.into_iter().collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(dlq_topic::Entity::find()
            .filter(dlq_topic::Column::Id.is_in(ids))
            .all(self.conn)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect())
    }

    pub async fn registered_names(&self) -> Result<HashSet<String>, DbErr> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .map(|t| t.dlq_topic_name)
            .collect())
    }
}

/// Match cluster topics against the DLQ naming conventions and propose
/// registrations. Pure; broker metadata and registry state come in as
/// arguments.
pub fn propose_dlq_topics(
    cluster_topics: &[String],
    registered: &HashSet<String>,
) -> Vec<DiscoveredTopic> {
    cluster_topics
        .iter()
        .filter_map(|name| {
            dlq_suffix_of(name).map(|suffix| DiscoveredTopic {
                dlq_topic_name: name.clone(),
                guessed_destination: name[..name.len() - suffix.len()].to_owned(),
                already_registered: registered.contains(name),
            })
        })
        .collect()
}

fn dlq_suffix_of(name: &str) -> Option<&'static str> {
    let lowered = name.to_lowercase();
    DLQ_SUFFIXES
        .iter()
        .find(|suffix| lowered.ends_with(&suffix.to_lowercase()))
        .copied()
}
