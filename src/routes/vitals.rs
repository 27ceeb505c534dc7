use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use serde::Serialize;

use crate::db::records::{self, Owned};
use crate::error::Result;
use crate::models::{NewVitalSign, VitalSign, VitalSignUpdate};
use crate::routes::extract::{AppJson, AppPath};
use crate::routes::{AuthUser, MessageResponse};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalSignResponse {
    pub message: String,
    pub vital_sign: VitalSign,
}

/// Attach a vital sign to one of the caller's records
pub async fn add_vital_sign(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath(record_id): AppPath<u64>,
    AppJson(payload): AppJson<NewVitalSign>,
) -> Result<(StatusCode, Json<VitalSignResponse>)> {
    let now = Utc::now();
    let draft = payload.validate(now)?;

    let db = state.db.clone();
    let vital_sign = tokio::task::spawn_blocking(move || {
        records::add_vital_sign(
            &db,
            Owned::new(record_id, auth.user_id),
            draft,
            now.timestamp_millis(),
        )
    })
    .await??;

    Ok((
        StatusCode::CREATED,
        Json(VitalSignResponse {
            message: "Vital sign added successfully".to_string(),
            vital_sign,
        }),
    ))
}

pub async fn update_vital_sign(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath((record_id, vital_id)): AppPath<(u64, u64)>,
    AppJson(payload): AppJson<VitalSignUpdate>,
) -> Result<Json<VitalSignResponse>> {
    let db = state.db.clone();
    let vital_sign = tokio::task::spawn_blocking(move || {
        records::update_vital_sign(
            &db,
            Owned::new(record_id, auth.user_id),
            vital_id,
            payload,
            Utc::now(),
        )
    })
    .await??;

    Ok(Json(VitalSignResponse {
        message: "Vital sign updated successfully".to_string(),
        vital_sign,
    }))
}

pub async fn delete_vital_sign(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath((record_id, vital_id)): AppPath<(u64, u64)>,
) -> Result<Json<MessageResponse>> {
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || {
        records::delete_vital_sign(&db, Owned::new(record_id, auth.user_id), vital_id)
    })
    .await??;

    Ok(MessageResponse::new("Vital sign deleted successfully"))
}
