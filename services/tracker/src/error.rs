//! Custom error types for the tracker service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::models::MAX_WORK_MINUTES_PER_DAY;

/// Errors surfaced by the session and configuration use cases
#[derive(Error, Debug)]
pub enum TrackerError {
    /// Check-out on a date that has no session
    #[error("no check-in found for {0}")]
    NoCheckIn(NaiveDate),

    /// Configured work duration above one day
    #[error(
        "work hours cannot exceed {max} minutes (24 hours), got {0}",
        max = MAX_WORK_MINUTES_PER_DAY
    )]
    WorkMinutesOutOfRange(i64),

    /// Storage failure, with what was being done at the time
    #[error("failed to {context}: {source}")]
    Persistence {
        context: &'static str,
        #[source]
        source: DatabaseError,
    },
}

impl TrackerError {
    pub fn persistence(context: &'static str) -> impl FnOnce(DatabaseError) -> Self {
        move |source| TrackerError::Persistence { context, source }
    }

    /// True for errors caused by the request rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TrackerError::NoCheckIn(_) | TrackerError::WorkMinutesOutOfRange(_)
        )
    }
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let (status, error_message) = if self.is_client_error() {
            (StatusCode::BAD_REQUEST, self.to_string())
        } else {
            error!("Request failed: {}", self);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for tracker results
pub type TrackerResult<T> = Result<T, TrackerError>;
