//! Application state shared across handlers

use sqlx::SqlitePool;

use crate::usecase::WorkService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub work_service: WorkService,
}
