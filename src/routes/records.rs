use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use serde::Serialize;

use crate::db::records::{self, Owned};
use crate::error::Result;
use crate::models::{HealthRecord, HealthRecordUpdate, NewHealthRecord};
use crate::routes::extract::{AppJson, AppPath, AppQuery};
use crate::routes::validation::{ListParams, StatisticsParams};
use crate::routes::{AuthUser, MessageResponse};
use crate::stats::{self, StatisticsReport};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RecordListResponse {
    pub count: usize,
    pub records: Vec<HealthRecord>,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub record: HealthRecord,
}

#[derive(Debug, Serialize)]
pub struct RecordMutationResponse {
    pub message: String,
    pub record: HealthRecord,
}

/// List the caller's records, newest first unless `sortBy` says otherwise
pub async fn list_records(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<RecordListResponse>> {
    let (sort_by, limit) = params.resolve()?;

    let db = state.db.clone();
    let records = tokio::task::spawn_blocking(move || {
        records::list_records(&db, auth.user_id, sort_by, limit)
    })
    .await??;

    Ok(Json(RecordListResponse {
        count: records.len(),
        records,
    }))
}

pub async fn get_record(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath(id): AppPath<u64>,
) -> Result<Json<RecordResponse>> {
    let db = state.db.clone();
    let record = tokio::task::spawn_blocking(move || {
        records::get_record(&db, Owned::new(id, auth.user_id))
    })
    .await??;

    Ok(Json(RecordResponse { record }))
}

/// Create a record with optional nested vital signs
///
/// Everything is validated up front; one bad vital sign rejects the whole
/// request and nothing is written.
pub async fn create_record(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppJson(payload): AppJson<NewHealthRecord>,
) -> Result<(StatusCode, Json<RecordMutationResponse>)> {
    let now = Utc::now();
    let draft = payload.validate(now)?;

    let db = state.db.clone();
    let record = tokio::task::spawn_blocking(move || {
        records::create_record(&db, auth.user_id, draft, now.timestamp_millis())
    })
    .await??;

    Ok((
        StatusCode::CREATED,
        Json(RecordMutationResponse {
            message: "Record created successfully".to_string(),
            record,
        }),
    ))
}

pub async fn update_record(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath(id): AppPath<u64>,
    AppJson(payload): AppJson<HealthRecordUpdate>,
) -> Result<Json<RecordMutationResponse>> {
    let db = state.db.clone();
    let record = tokio::task::spawn_blocking(move || {
        records::update_record(
            &db,
            Owned::new(id, auth.user_id),
            payload,
            Utc::now().timestamp_millis(),
        )
    })
    .await??;

    Ok(Json(RecordMutationResponse {
        message: "Record updated successfully".to_string(),
        record,
    }))
}

pub async fn delete_record(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath(id): AppPath<u64>,
) -> Result<Json<MessageResponse>> {
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || {
        records::delete_record(&db, Owned::new(id, auth.user_id))
    })
    .await??;

    Ok(MessageResponse::new("Record deleted successfully"))
}

/// Aggregate the caller's records over `period` (default: month)
pub async fn get_statistics(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppQuery(params): AppQuery<StatisticsParams>,
) -> Result<Json<StatisticsReport>> {
    let period = params.resolve()?;

    let db = state.db.clone();
    let records =
        tokio::task::spawn_blocking(move || records::all_records(&db, auth.user_id)).await??;

    Ok(Json(stats::compute(&records, period, Utc::now())))
}
