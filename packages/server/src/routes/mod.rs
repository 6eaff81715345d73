use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/dlq-topics", dlq_topic_routes())
        .nest("/replay", replay_routes())
}

fn dlq_topic_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::topics::list_dlq_topics,
            handlers::topics::register_dlq_topic
        ))
        .routes(routes!(handlers::topics::discover_dlq_topics))
        .routes(routes!(
            handlers::topics::get_dlq_topic,
            handlers::topics::update_dlq_topic,
            handlers::topics::delete_dlq_topic
        ))
        .routes(routes!(handlers::browse::browse_messages))
        .routes(routes!(handlers::browse::message_count))
        .routes(routes!(handlers::browse::error_breakdown))
}

fn replay_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::replay::replay_single))
        .routes(routes!(handlers::replay::replay_bulk))
        .routes(routes!(handlers::replay::get_replay_job))
        .routes(routes!(handlers::replay::replay_history))
}
