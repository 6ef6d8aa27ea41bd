//! Session lifecycle, configuration and statistics use cases

use chrono::{DateTime, FixedOffset, NaiveDate};
use std::sync::Arc;
use tracing::info;

use crate::{
    clients::AttendanceProvider,
    error::{TrackerError, TrackerResult},
    models::{
        MAX_WORK_MINUTES_PER_DAY, MonthlyStats, WorkConfig, WorkSession, YearMonth,
        dto::{
            CheckInRequest, CheckInResponse, CheckOutRequest, CheckOutResponse, ConfigRequest,
            ConfigResponse, MonthlyStatsResponse, StatusResponse, TodayCheckInRequest,
            TodayCheckInResponse,
        },
    },
    repositories::Repository,
};

/// Work tracking use cases shared by the HTTP handlers
#[derive(Clone)]
pub struct WorkService {
    repo: Arc<dyn Repository>,
    attendance: Arc<dyn AttendanceProvider>,
}

impl WorkService {
    pub fn new(repo: Arc<dyn Repository>, attendance: Arc<dyn AttendanceProvider>) -> Self {
        Self { repo, attendance }
    }

    async fn load_config(&self) -> TrackerResult<WorkConfig> {
        self.repo
            .get_config()
            .await
            .map_err(TrackerError::persistence("get config"))
    }

    async fn load_session(&self, date: NaiveDate) -> TrackerResult<Option<WorkSession>> {
        self.repo
            .get_today_session(date)
            .await
            .map_err(TrackerError::persistence("get session"))
    }

    /// Check in, creating the session of that date or restarting it
    pub async fn check_in(&self, req: CheckInRequest) -> TrackerResult<CheckInResponse> {
        let check_in = req.check_in_time;
        let date = check_in.date_naive();
        let config = self.load_config().await?;

        let session = match self.load_session(date).await? {
            Some(mut session) => {
                info!("Re-checking in on {} at {}", date, check_in);
                session.check_in_again(check_in, config.default_work_minutes);
                session
            }
            None => {
                info!("New check-in on {} at {}", date, check_in);
                WorkSession::new(check_in, config.default_work_minutes)
            }
        };

        self.repo
            .save_session(&session)
            .await
            .map_err(TrackerError::persistence("save session"))?;

        Ok(CheckInResponse {
            session_id: session.id,
            check_in_time: session.check_in,
            expected_check_out_time: session.expected_check_out(),
            work_hours: session.work_minutes,
        })
    }

    /// Check out of the session of that date; never creates a session
    pub async fn check_out(&self, req: CheckOutRequest) -> TrackerResult<CheckOutResponse> {
        let check_out = req.check_out_time;
        let date = check_out.date_naive();

        let mut session = self
            .load_session(date)
            .await?
            .ok_or(TrackerError::NoCheckIn(date))?;

        session.check_out = Some(check_out);
        self.repo
            .save_session(&session)
            .await
            .map_err(TrackerError::persistence("save check-out"))?;

        let overtime_minutes = session.overtime_minutes();
        info!(
            "Checked out at {}, overtime {} minutes",
            check_out, overtime_minutes
        );

        Ok(CheckOutResponse {
            session_id: session.id,
            check_in_time: session.check_in,
            check_out_time: check_out,
            overtime_minutes,
        })
    }

    /// Work status of the day `now` falls on
    pub async fn status(&self, now: DateTime<FixedOffset>) -> TrackerResult<StatusResponse> {
        let session = self.load_session(now.date_naive()).await?;

        let Some(session) = session else {
            let config = self.load_config().await?;
            return Ok(StatusResponse {
                has_checked_in: false,
                check_in_time: None,
                check_out_time: None,
                expected_check_out_time: None,
                current_time: now,
                work_hours: config.default_work_minutes,
                is_check_out_time: false,
                overtime_minutes: 0,
            });
        };

        let expected = session.expected_check_out();
        Ok(StatusResponse {
            has_checked_in: true,
            check_in_time: Some(session.check_in),
            check_out_time: session.check_out,
            expected_check_out_time: Some(expected),
            current_time: now,
            work_hours: session.work_minutes,
            is_check_out_time: now > expected,
            overtime_minutes: session.overtime_minutes(),
        })
    }

    /// Check-in of a date, from storage or fetched from the HR API
    pub async fn today_check_in(
        &self,
        req: TodayCheckInRequest,
    ) -> TrackerResult<TodayCheckInResponse> {
        let session = self.load_session(req.date).await?;
        if !req.re_check_in && let Some(session) = &session {
            return Ok(TodayCheckInResponse {
                has_checked_in: true,
                check_in_time: Some(session.check_in),
                can_auto_fetch: false,
                auto_fetch_enabled: false,
                api_error: None,
            });
        }

        let config = self.load_config().await?;
        if config.should_auto_fetch() {
            return Ok(self.auto_fetch_check_in(req.date, session, &config).await);
        }

        Ok(TodayCheckInResponse {
            has_checked_in: false,
            check_in_time: None,
            can_auto_fetch: config.has_api_config(),
            auto_fetch_enabled: config.auto_fetch_enabled,
            api_error: None,
        })
    }

    /// Fetch the check-in from the HR API and store it.
    ///
    /// Never fails: fetch and save problems come back in `api_error`.
    async fn auto_fetch_check_in(
        &self,
        date: NaiveDate,
        existing: Option<WorkSession>,
        config: &WorkConfig,
    ) -> TodayCheckInResponse {
        let status = match self.attendance.fetch_attendance_status(config, date).await {
            Ok(status) => status,
            Err(e) => {
                info!("Failed to auto-fetch check-in time: {}", e);
                return auto_fetch_error(None, e.to_string());
            }
        };

        let Some(check_in) = status.check_in else {
            info!("No check-in recorded for {}", date);
            return auto_fetch_error(None, TrackerError::NoCheckIn(date).to_string());
        };

        info!("Auto-fetched check-in time {}", check_in);

        let session = match existing {
            Some(mut session) => {
                session.check_in_again(check_in, config.default_work_minutes);
                session
            }
            None => WorkSession::with_id(
                uuid::Uuid::new_v4(),
                date,
                check_in,
                config.default_work_minutes,
            ),
        };

        if let Err(e) = self.repo.save_session(&session).await {
            info!("Failed to save auto-fetched session: {}", e);
            return auto_fetch_error(Some(check_in), format!("Failed to save session: {}", e));
        }

        TodayCheckInResponse {
            has_checked_in: true,
            check_in_time: Some(check_in),
            can_auto_fetch: true,
            auto_fetch_enabled: true,
            api_error: None,
        }
    }

    /// Replace the configuration.
    ///
    /// A positive `work_hours` also resizes the session of `today`, so its
    /// expected check-out follows the new duration.
    pub async fn update_config(&self, req: ConfigRequest, today: NaiveDate) -> TrackerResult<()> {
        if req.work_hours > MAX_WORK_MINUTES_PER_DAY {
            return Err(TrackerError::WorkMinutesOutOfRange(req.work_hours));
        }

        let mut config = self.load_config().await?;
        let work_minutes = (req.work_hours > 0).then_some(req.work_hours);

        if let Some(minutes) = work_minutes {
            config.default_work_minutes = minutes;
        }
        config.check_in_api_url = req.check_in_api_url;
        config.auto_fetch_enabled = req.auto_fetch_enabled;
        config.p_auth = req.p_auth;
        config.p_rtoken = req.p_rtoken;
        config.check_in_webhook_url = req.check_in_webhook_url;
        config.check_out_webhook_url = req.check_out_webhook_url;

        self.repo
            .save_config(&config)
            .await
            .map_err(TrackerError::persistence("save config"))?;

        if let Some(minutes) = work_minutes
            && let Some(mut session) = self.load_session(today).await?
        {
            session.work_minutes = minutes;
            self.repo
                .save_session(&session)
                .await
                .map_err(TrackerError::persistence("update session work hours"))?;
            info!("Updated today's session to {} minutes", minutes);
        }

        info!("Configuration updated successfully");
        Ok(())
    }

    pub async fn config(&self) -> TrackerResult<ConfigResponse> {
        Ok(self.load_config().await?.into())
    }

    /// Statistics of the month of `today` and of the month before
    pub async fn monthly_stats(&self, today: NaiveDate) -> TrackerResult<MonthlyStatsResponse> {
        let current_month = YearMonth::of(today);
        let last_month = current_month.previous();

        let current = self.month_stats(current_month).await?;
        let last = self.month_stats(last_month).await?;

        Ok(MonthlyStatsResponse {
            current_month: current.into(),
            last_month: last.into(),
        })
    }

    async fn month_stats(&self, year_month: YearMonth) -> TrackerResult<MonthlyStats> {
        let sessions = self
            .repo
            .get_sessions_by_month(year_month)
            .await
            .map_err(TrackerError::persistence("get month sessions"))?;

        Ok(MonthlyStats::aggregate(&sessions, year_month))
    }
}

/// Auto-fetch response carrying an API error instead of a check-in
fn auto_fetch_error(
    check_in_time: Option<DateTime<FixedOffset>>,
    message: String,
) -> TodayCheckInResponse {
    TodayCheckInResponse {
        has_checked_in: false,
        check_in_time,
        can_auto_fetch: true,
        auto_fetch_enabled: true,
        api_error: Some(message),
    }
}
