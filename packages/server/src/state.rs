use std::sync::Arc;

use broker::{ClusterAdmin, ErrorAnalyzer, PartitionBrowser, ReplayProducer};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub browser: Arc<PartitionBrowser>,
    pub analyzer: Arc<ErrorAnalyzer>,
    pub producer: Arc<ReplayProducer>,
    pub admin: Arc<ClusterAdmin>,
    pub config: AppConfig,
}
