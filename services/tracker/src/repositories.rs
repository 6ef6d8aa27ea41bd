//! Persistence boundary for sessions and the configuration row

use async_trait::async_trait;
use chrono::NaiveDate;
use common::error::DatabaseResult;

use crate::models::{WorkConfig, WorkSession, YearMonth};

pub mod sqlite;

pub use sqlite::SqliteRepository;

/// Storage used by the use cases and the reminder scheduler.
///
/// Production uses [`SqliteRepository`]; unit tests inject
/// `MockRepository` when they need to observe or fail writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Repository: Send + Sync {
    /// The session of `date`, if one was recorded
    async fn get_today_session(&self, date: NaiveDate) -> DatabaseResult<Option<WorkSession>>;

    /// All sessions of a month, oldest first
    async fn get_sessions_by_month(
        &self,
        year_month: YearMonth,
    ) -> DatabaseResult<Vec<WorkSession>>;

    /// Insert or replace a session, keyed by its date
    async fn save_session(&self, session: &WorkSession) -> DatabaseResult<()>;

    async fn get_config(&self) -> DatabaseResult<WorkConfig>;

    async fn save_config(&self, config: &WorkConfig) -> DatabaseResult<()>;
}
