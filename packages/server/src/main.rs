use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use broker::{BrokerConfig, ClusterAdmin, ErrorAnalyzer, PartitionBrowser, ReplayProducer};
use tracing::{Level, info, warn};

use server::config::AppConfig;
use server::database::init_db;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let db = init_db(&config.database.url).await?;
    info!("database ready, schema synced");

    let broker_config = BrokerConfig::new(&config.kafka.bootstrap_servers);
    let producer = Arc::new(ReplayProducer::new(&broker_config)?);
    let state = AppState {
        db,
        browser: Arc::new(PartitionBrowser::new(broker_config.clone())),
        analyzer: Arc::new(ErrorAnalyzer::new(broker_config.clone())),
        admin: Arc::new(ClusterAdmin::new(broker_config)),
        producer: producer.clone(),
        config: config.clone(),
    };

    let app = server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("DLQ manager listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let in-flight replays reach the broker before the process exits.
    if let Err(e) = producer.flush(Duration::from_secs(10)).await {
        warn!("producer flush on shutdown failed: {}", e);
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
    }
}
