use axum::{extract::State, middleware, routing::get, Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    app_state::AppState,
    middleware::tracing::observability_middleware,
    modules::api_routes,
    telemetry::{counters, telemetry_health_check},
    websocket::websocket_routes,
};

pub fn create_router(state: AppState) -> Router {
    let cors = if state.env.is_production() {
        CorsLayer::new()
    } else {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/", get(hello))
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .merge(websocket_routes())
        .layer(middleware::from_fn(observability_middleware))
        .layer(cors)
        .with_state(state)
}

async fn hello() -> &'static str {
    "Clinic scheduler says hello!\n"
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db_status = match &state.db {
        Some(pool) => match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => "healthy",
            Err(e) => {
                tracing::info!("Database health check failed: {}", e);
                "unhealthy"
            }
        },
        None => "in_memory",
    };

    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.env.app.environment.to_string(),
        "slot_minutes": state.scheduler.grid().slot_minutes(),
        "services": {
            "database": db_status,
            "telemetry": telemetry_health_check()
        },
        "counters": counters::snapshot()
    }))
}
