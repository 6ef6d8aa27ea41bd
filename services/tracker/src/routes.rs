//! Tracker HTTP routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Local;
use serde_json::json;
use std::path::Path;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    error::TrackerResult,
    models::dto::{
        CheckInRequest, CheckInResponse, CheckOutRequest, CheckOutResponse, ConfigRequest,
        ConfigResponse, MonthlyStatsResponse, StatusResponse, TodayCheckInRequest,
        TodayCheckInResponse,
    },
    state::AppState,
};

/// Create the router for the tracker service.
///
/// Paths outside `/health` and `/api` are served from `static_dir`, where the
/// built web frontend lives.
pub fn create_router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    let api = Router::new()
        .route("/checkin", post(check_in))
        .route("/checkout", post(check_out))
        .route("/status", get(status))
        .route("/today-checkin", post(today_check_in))
        .route("/monthly-stats", get(monthly_stats))
        .route("/config", get(get_config).post(update_config));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match common::database::health_check(&state.db_pool).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "worktime"
            })),
        ),
        result => {
            if let Err(e) = result {
                tracing::error!("Database health check failed: {}", e);
            }
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "service": "worktime"
                })),
            )
        }
    }
}

pub async fn check_in(
    State(state): State<AppState>,
    Json(payload): Json<CheckInRequest>,
) -> TrackerResult<Json<CheckInResponse>> {
    Ok(Json(state.work_service.check_in(payload).await?))
}

pub async fn check_out(
    State(state): State<AppState>,
    Json(payload): Json<CheckOutRequest>,
) -> TrackerResult<Json<CheckOutResponse>> {
    Ok(Json(state.work_service.check_out(payload).await?))
}

/// Status of today, as seen from the server clock
pub async fn status(State(state): State<AppState>) -> TrackerResult<Json<StatusResponse>> {
    let now = Local::now().fixed_offset();
    Ok(Json(state.work_service.status(now).await?))
}

pub async fn today_check_in(
    State(state): State<AppState>,
    Json(payload): Json<TodayCheckInRequest>,
) -> TrackerResult<Json<TodayCheckInResponse>> {
    Ok(Json(state.work_service.today_check_in(payload).await?))
}

pub async fn monthly_stats(
    State(state): State<AppState>,
) -> TrackerResult<Json<MonthlyStatsResponse>> {
    let today = Local::now().date_naive();
    Ok(Json(state.work_service.monthly_stats(today).await?))
}

pub async fn get_config(State(state): State<AppState>) -> TrackerResult<Json<ConfigResponse>> {
    Ok(Json(state.work_service.config().await?))
}

pub async fn update_config(
    State(state): State<AppState>,
    Json(payload): Json<ConfigRequest>,
) -> TrackerResult<impl IntoResponse> {
    let today = Local::now().date_naive();
    state.work_service.update_config(payload, today).await?;

    Ok(Json(json!({ "status": "success" })))
}
