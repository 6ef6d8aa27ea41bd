//! SQLite implementation of the repository

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{CONFIG_ID, WorkConfig, WorkSession, YearMonth};
use crate::repositories::Repository;

/// Repository backed by the `work_sessions` and `work_config` tables
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Create a new repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply pending migrations, creating the tables and the default config row
    pub async fn migrate(&self) -> DatabaseResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        info!("Database migrations applied");
        Ok(())
    }

    fn session_from_row(row: &SqliteRow) -> DatabaseResult<WorkSession> {
        let id: String = row.try_get("id").map_err(DatabaseError::Query)?;
        let id = Uuid::parse_str(&id)
            .map_err(|e| DatabaseError::Decode(format!("invalid session id {}: {}", id, e)))?;

        Ok(WorkSession {
            id,
            date: row.try_get("date").map_err(DatabaseError::Query)?,
            check_in: row.try_get("check_in").map_err(DatabaseError::Query)?,
            check_out: row.try_get("check_out").map_err(DatabaseError::Query)?,
            work_minutes: row.try_get("work_minutes").map_err(DatabaseError::Query)?,
        })
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn get_today_session(&self, date: NaiveDate) -> DatabaseResult<Option<WorkSession>> {
        let row = sqlx::query(
            r#"
            SELECT id, date, check_in, check_out, work_minutes
            FROM work_sessions
            WHERE date = ?
            "#,
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        row.as_ref().map(Self::session_from_row).transpose()
    }

    async fn get_sessions_by_month(
        &self,
        year_month: YearMonth,
    ) -> DatabaseResult<Vec<WorkSession>> {
        let rows = sqlx::query(
            r#"
            SELECT id, date, check_in, check_out, work_minutes
            FROM work_sessions
            WHERE date LIKE ?
            ORDER BY date ASC
            "#,
        )
        .bind(format!("{}-%", year_month))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        rows.iter().map(Self::session_from_row).collect()
    }

    async fn save_session(&self, session: &WorkSession) -> DatabaseResult<()> {
        let check_out: Option<DateTime<FixedOffset>> = session.check_out;

        sqlx::query(
            r#"
            INSERT INTO work_sessions (id, date, check_in, check_out, work_minutes)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (date) DO UPDATE SET
            id = excluded.id,
            check_in = excluded.check_in,
            check_out = excluded.check_out,
            work_minutes = excluded.work_minutes
            "#,
        )
        .bind(session.id.to_string())
        .bind(session.date)
        .bind(session.check_in)
        .bind(check_out)
        .bind(session.work_minutes)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(())
    }

    async fn get_config(&self) -> DatabaseResult<WorkConfig> {
        let row = sqlx::query(
            r#"
            SELECT id, default_work_minutes, check_in_api_url, auto_fetch_enabled,
                   p_auth, p_rtoken, check_in_webhook_url, check_out_webhook_url
            FROM work_config
            WHERE id = ?
            "#,
        )
        .bind(CONFIG_ID)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(WorkConfig {
            id: row.try_get("id").map_err(DatabaseError::Query)?,
            default_work_minutes: row
                .try_get("default_work_minutes")
                .map_err(DatabaseError::Query)?,
            check_in_api_url: row
                .try_get("check_in_api_url")
                .map_err(DatabaseError::Query)?,
            auto_fetch_enabled: row
                .try_get("auto_fetch_enabled")
                .map_err(DatabaseError::Query)?,
            p_auth: row.try_get("p_auth").map_err(DatabaseError::Query)?,
            p_rtoken: row.try_get("p_rtoken").map_err(DatabaseError::Query)?,
            check_in_webhook_url: row
                .try_get("check_in_webhook_url")
                .map_err(DatabaseError::Query)?,
            check_out_webhook_url: row
                .try_get("check_out_webhook_url")
                .map_err(DatabaseError::Query)?,
        })
    }

    async fn save_config(&self, config: &WorkConfig) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            INSERT INTO work_config (
                id, default_work_minutes, check_in_api_url, auto_fetch_enabled,
                p_auth, p_rtoken, check_in_webhook_url, check_out_webhook_url
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
            default_work_minutes = excluded.default_work_minutes,
            check_in_api_url = excluded.check_in_api_url,
            auto_fetch_enabled = excluded.auto_fetch_enabled,
            p_auth = excluded.p_auth,
            p_rtoken = excluded.p_rtoken,
            check_in_webhook_url = excluded.check_in_webhook_url,
            check_out_webhook_url = excluded.check_out_webhook_url
            "#,
        )
        .bind(&config.id)
        .bind(config.default_work_minutes)
        .bind(&config.check_in_api_url)
        .bind(config.auto_fetch_enabled)
        .bind(&config.p_auth)
        .bind(&config.p_rtoken)
        .bind(&config.check_in_webhook_url)
        .bind(&config.check_out_webhook_url)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(())
    }
}
