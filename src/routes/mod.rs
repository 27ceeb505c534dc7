pub mod auth;
pub mod extract;
pub mod health;
pub mod middleware;
pub mod records;
pub mod validation;
pub mod vitals;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::any::Any;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::error::expose_error_details;
use crate::{AppState, Config};

pub use middleware::{require_auth, AuthUser};

/// Body of responses that only carry a confirmation message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}

/// JSON 404 for any route not matched above
async fn not_found(method: Method, uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Endpoint not found",
            "message": format!("Cannot {} {}", method, uri),
            "availableEndpoints": {
                "auth": "/api/auth",
                "records": "/api/records",
            },
        })),
    )
        .into_response()
}

/// Build the application router
///
/// Public: `/`, `/health`, register and login. Everything else requires a
/// bearer token and sees only the caller's own data.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/auth/profile",
            get(auth::get_profile).put(auth::update_profile),
        )
        .route("/api/auth/change-password", put(auth::change_password))
        .route(
            "/api/records",
            get(records::list_records).post(records::create_record),
        )
        .route("/api/records/statistics", get(records::get_statistics))
        .route(
            "/api/records/:id",
            get(records::get_record)
                .put(records::update_record)
                .delete(records::delete_record),
        )
        .route("/api/records/:id/vitals", post(vitals::add_vital_sign))
        .route(
            "/api/records/:id/vitals/:vital_id",
            put(vitals::update_vital_sign).delete(vitals::delete_vital_sign),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let app = Router::new()
        .route("/", get(health::api_index))
        .route("/health", get(health::health_check))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .merge(protected)
        .fallback(not_found)
        .layer(axum::middleware::map_response_with_state(
            state.clone(),
            expose_error_details,
        ))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors_layer(&state.config));

    let app = if state.config.log_requests {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    };

    app.with_state(state)
}
