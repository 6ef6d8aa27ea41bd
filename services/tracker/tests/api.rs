//! Router tests over an in-memory database

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chrono::{DateTime, Local, NaiveDate};
use common::database::{DatabaseConfig, init_pool};
use serde_json::{Value, json};
use std::{path::Path, sync::Arc};
use tower::ServiceExt;

use tracker::{
    AppState,
    clients::{AttendanceProvider, AttendanceStatus, ProviderResult},
    models::WorkConfig,
    repositories::SqliteRepository,
    routes::create_router,
    usecase::WorkService,
};

/// HR API stand-in that always reports the same attendance
struct FixedAttendance(AttendanceStatus);

#[async_trait]
impl AttendanceProvider for FixedAttendance {
    async fn fetch_attendance_status(
        &self,
        _config: &WorkConfig,
        _date: NaiveDate,
    ) -> ProviderResult<AttendanceStatus> {
        Ok(self.0)
    }
}

async fn app_serving(attendance: AttendanceStatus, static_dir: &Path) -> Router {
    let pool = init_pool(&DatabaseConfig::in_memory()).await.unwrap();
    let repository = SqliteRepository::new(pool.clone());
    repository.migrate().await.unwrap();

    let attendance = Arc::new(FixedAttendance(attendance));
    let state = AppState {
        db_pool: pool,
        work_service: WorkService::new(Arc::new(repository), attendance),
    };
    create_router(state, static_dir)
}

async fn app_with(attendance: AttendanceStatus) -> Router {
    app_serving(attendance, Path::new("frontend/out")).await
}

async fn app() -> Router {
    app_with(AttendanceStatus::default()).await
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_reports_database() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_other_paths_serve_the_frontend() {
    let static_dir = tempfile::tempdir().unwrap();
    let index = static_dir.path().join("index.html");
    std::fs::write(&index, "<h1>Worktime</h1>").unwrap();
    let app = app_serving(AttendanceStatus::default(), static_dir.path()).await;

    let request = Request::get("/").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<h1>Worktime</h1>");

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "worktime");

    let (status, _) = send(&app, Method::GET, "/assets/missing.js", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_check_in_then_check_out() {
    let app = app().await;

    let (status, checked_in) = send(
        &app,
        Method::POST,
        "/api/checkin",
        Some(json!({"check_in_time": "2025-10-13T09:00:00+08:00"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        checked_in["expected_check_out_time"],
        "2025-10-13T17:00:00+08:00"
    );
    assert_eq!(checked_in["work_hours"], 480);

    let (status, checked_out) = send(
        &app,
        Method::POST,
        "/api/checkout",
        Some(json!({"check_out_time": "2025-10-13T19:45:00+08:00"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(checked_out["session_id"], checked_in["session_id"]);
    assert_eq!(checked_out["overtime_minutes"], 45);
}

#[tokio::test]
async fn test_check_out_without_check_in_is_bad_request() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/checkout",
        Some(json!({"check_out_time": "2025-10-13T19:00:00+08:00"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "no check-in found for 2025-10-13");
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let app = app().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/checkin",
        Some(json!({"check_in_time": "yesterday morning"})),
    )
    .await;

    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_status_follows_todays_session() {
    let app = app().await;

    let (_, before) = send(&app, Method::GET, "/api/status", None).await;
    assert_eq!(before["has_checked_in"], false);
    assert_eq!(before["work_hours"], 480);
    assert!(before.get("check_in_time").is_none());

    let now = Local::now().fixed_offset();
    send(
        &app,
        Method::POST,
        "/api/checkin",
        Some(json!({"check_in_time": now})),
    )
    .await;

    let (status, after) = send(&app, Method::GET, "/api/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["has_checked_in"], true);
    assert_eq!(after["is_check_out_time"], false);
    let check_in = after["check_in_time"].as_str().unwrap();
    assert_eq!(DateTime::parse_from_rfc3339(check_in).unwrap(), now);
}

#[tokio::test]
async fn test_config_round_trip_and_validation() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/config",
        Some(json!({"work_hours": 1500})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("1440"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/config",
        Some(json!({
            "work_hours": 540,
            "check_out_webhook_url": "https://ntfy.example.com/out"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success"}));

    let (status, config) = send(&app, Method::GET, "/api/config", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(config["work_hours"], 540);
    assert_eq!(
        config["check_out_webhook_url"],
        "https://ntfy.example.com/out"
    );
    assert_eq!(config["auto_fetch_enabled"], false);
}

#[tokio::test]
async fn test_today_check_in_auto_fetches_from_hr_api() {
    let fetched = DateTime::parse_from_rfc3339("2025-10-13T09:21:00+08:00").unwrap();
    let app = app_with(AttendanceStatus {
        check_in: Some(fetched),
        check_out: None,
    })
    .await;

    let (_, disabled) = send(
        &app,
        Method::POST,
        "/api/today-checkin",
        Some(json!({"date": "2025-10-13"})),
    )
    .await;
    assert_eq!(disabled["has_checked_in"], false);
    assert_eq!(disabled["can_auto_fetch"], false);

    send(
        &app,
        Method::POST,
        "/api/config",
        Some(json!({
            "check_in_api_url": "https://hr.example.com/attendance",
            "auto_fetch_enabled": true,
            "p_auth": "auth",
            "p_rtoken": "token"
        })),
    )
    .await;

    let (status, fetched_body) = send(
        &app,
        Method::POST,
        "/api/today-checkin",
        Some(json!({"date": "2025-10-13"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched_body["has_checked_in"], true);
    assert!(fetched_body.get("api_error").is_none());

    let (_, checked_out) = send(
        &app,
        Method::POST,
        "/api/checkout",
        Some(json!({"check_out_time": "2025-10-13T19:21:00+08:00"})),
    )
    .await;
    assert_eq!(checked_out["check_in_time"], "2025-10-13T09:21:00+08:00");
    assert_eq!(checked_out["overtime_minutes"], 0);
}

#[tokio::test]
async fn test_monthly_stats_has_both_months() {
    let app = app().await;
    let now = Local::now().fixed_offset();
    send(
        &app,
        Method::POST,
        "/api/checkin",
        Some(json!({"check_in_time": now})),
    )
    .await;

    let (status, stats) = send(&app, Method::GET, "/api/monthly-stats", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        stats["current_month"]["year_month"],
        now.format("%Y-%m").to_string()
    );
    assert_eq!(stats["current_month"]["total_days"], 1);
    assert_eq!(stats["current_month"]["checked_out_days"], 0);
    assert_eq!(stats["last_month"]["total_days"], 0);
}
