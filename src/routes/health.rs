use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: &'static str,
    pub environment: String,
    pub version: &'static str,
}

/// Short description of the API for anyone hitting the root URL
pub async fn api_index() -> Json<Value> {
    Json(json!({
        "name": "Health Tracker API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/api/auth",
            "records": "/api/records",
            "health": "/health",
        },
    }))
}

fn health_status(database: &'static str, environment: String) -> (StatusCode, HealthStatus) {
    let (code, status) = if database == "connected" {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "unhealthy")
    };

    (
        code,
        HealthStatus {
            status,
            database,
            environment,
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

/// Liveness check: the store must accept a read transaction, else 500
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let db = state.db.clone();
    let database = match tokio::task::spawn_blocking(move || db.begin_read().map(|_| ())).await {
        Ok(Ok(())) => "connected",
        Ok(Err(e)) => {
            tracing::error!("Store health check failed: {:?}", e);
            "disconnected"
        }
        Err(e) => {
            tracing::error!("Store health check task failed: {}", e);
            "error"
        }
    };

    let (code, status) = health_status(database, state.config.environment.clone());
    (code, Json(status))
}
