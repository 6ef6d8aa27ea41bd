//! Cron-driven check-in and check-out reminders

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use std::{fmt, sync::Arc};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::{
    clients::{AttendanceProvider, AttendanceStatus, HolidayProvider, Notifier},
    models::{WorkConfig, china_standard_time},
    repositories::Repository,
};

/// Every day at 09:55
pub const CHECK_IN_SCHEDULE: &str = "0 55 9 * * *";
/// Every day at 20:30 and again at 21:30
pub const CHECK_OUT_SCHEDULES: [&str; 2] = ["0 30 20 * * *", "0 30 21 * * *"];

pub const CHECK_IN_MESSAGE: &str = "⏰ Time to check in! Don't forget to clock in for work.";
pub const CHECK_OUT_MESSAGE: &str = "✅ Time to check out! Remember to clock out from work.";

/// Why a reminder tick did not notify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ConfigUnavailable,
    NoWebhook,
    Holiday,
    AlreadyCheckedIn,
    AlreadyCheckedOut,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::ConfigUnavailable => "config unavailable",
            SkipReason::NoWebhook => "webhook URL not configured",
            SkipReason::Holiday => "today is a holiday",
            SkipReason::AlreadyCheckedIn => "already checked in",
            SkipReason::AlreadyCheckedOut => "already checked out",
        };
        f.write_str(reason)
    }
}

/// Result of one reminder tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderOutcome {
    Sent,
    SendFailed(String),
    Skipped(SkipReason),
}

impl fmt::Display for ReminderOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReminderOutcome::Sent => f.write_str("reminder sent"),
            ReminderOutcome::SendFailed(e) => write!(f, "failed to send reminder: {}", e),
            ReminderOutcome::Skipped(reason) => write!(f, "skipped, {}", reason),
        }
    }
}

/// Decides whether a reminder is due and sends it
#[derive(Clone)]
pub struct ReminderService {
    repo: Arc<dyn Repository>,
    attendance: Arc<dyn AttendanceProvider>,
    holidays: Arc<dyn HolidayProvider>,
    notifier: Arc<dyn Notifier>,
    zone: FixedOffset,
}

impl ReminderService {
    pub fn new(
        repo: Arc<dyn Repository>,
        attendance: Arc<dyn AttendanceProvider>,
        holidays: Arc<dyn HolidayProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            repo,
            attendance,
            holidays,
            notifier,
            zone: china_standard_time(),
        }
    }

    pub fn zone(&self) -> FixedOffset {
        self.zone
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.zone).date_naive()
    }

    pub async fn check_in_reminder(&self) -> ReminderOutcome {
        self.remind_check_in(self.today()).await
    }

    pub async fn check_out_reminder(&self) -> ReminderOutcome {
        self.remind_check_out(self.today()).await
    }

    /// Remind to check in unless it is a holiday or the HR system already
    /// has a check-in for `today`
    pub async fn remind_check_in(&self, today: NaiveDate) -> ReminderOutcome {
        let Some(config) = self.load_config().await else {
            return ReminderOutcome::Skipped(SkipReason::ConfigUnavailable);
        };
        if config.check_in_webhook_url.is_empty() {
            info!("Check-in webhook URL not configured, skipping");
            return ReminderOutcome::Skipped(SkipReason::NoWebhook);
        }
        if self.is_holiday().await {
            info!("Today is a holiday, skipping check-in reminder");
            return ReminderOutcome::Skipped(SkipReason::Holiday);
        }

        let status = self.attendance_status(&config, today).await;
        if status.has_checked_in() {
            info!("Already checked in today, skipping reminder");
            return ReminderOutcome::Skipped(SkipReason::AlreadyCheckedIn);
        }

        self.notify(&config.check_in_webhook_url, CHECK_IN_MESSAGE)
            .await
    }

    /// Remind to check out unless it is a holiday or the HR system shows a
    /// check-out after the expected time
    pub async fn remind_check_out(&self, today: NaiveDate) -> ReminderOutcome {
        let Some(config) = self.load_config().await else {
            return ReminderOutcome::Skipped(SkipReason::ConfigUnavailable);
        };
        if config.check_out_webhook_url.is_empty() {
            info!("Check-out webhook URL not configured, skipping");
            return ReminderOutcome::Skipped(SkipReason::NoWebhook);
        }
        if self.is_holiday().await {
            info!("Today is a holiday, skipping check-out reminder");
            return ReminderOutcome::Skipped(SkipReason::Holiday);
        }

        let status = self.attendance_status(&config, today).await;
        if let AttendanceStatus {
            check_in: Some(check_in),
            check_out: Some(check_out),
        } = status
        {
            self.backfill_check_out(today, check_out).await;

            let expected = check_in + Duration::minutes(config.default_work_minutes);
            if check_out > expected {
                info!(
                    "Checked out at {} after expected {}, skipping reminder",
                    check_out, expected
                );
                return ReminderOutcome::Skipped(SkipReason::AlreadyCheckedOut);
            }
        }

        self.notify(&config.check_out_webhook_url, CHECK_OUT_MESSAGE)
            .await
    }

    async fn load_config(&self) -> Option<WorkConfig> {
        match self.repo.get_config().await {
            Ok(config) => Some(config),
            Err(e) => {
                error!("Failed to get config: {}", e);
                None
            }
        }
    }

    /// A failing holiday API counts as a working day
    async fn is_holiday(&self) -> bool {
        match self.holidays.is_holiday().await {
            Ok(is_holiday) => is_holiday,
            Err(e) => {
                warn!("Failed to check holiday status: {}", e);
                false
            }
        }
    }

    /// Nothing clocked when the HR API is not configured or fails
    async fn attendance_status(&self, config: &WorkConfig, today: NaiveDate) -> AttendanceStatus {
        if !config.has_api_config() {
            return AttendanceStatus::default();
        }

        match self.attendance.fetch_attendance_status(config, today).await {
            Ok(status) => status,
            Err(e) => {
                warn!("Failed to fetch attendance status: {}", e);
                AttendanceStatus::default()
            }
        }
    }

    /// Copy the HR check-out onto today's open session
    async fn backfill_check_out(&self, today: NaiveDate, check_out: DateTime<FixedOffset>) {
        let mut session = match self.repo.get_today_session(today).await {
            Ok(Some(session)) if !session.has_checked_out() => session,
            Ok(_) => return,
            Err(e) => {
                warn!("Failed to load session for backfill: {}", e);
                return;
            }
        };

        session.check_out = Some(check_out);
        match self.repo.save_session(&session).await {
            Ok(()) => info!("Backfilled check-out at {}", check_out),
            Err(e) => warn!("Failed to backfill check-out: {}", e),
        }
    }

    async fn notify(&self, url: &str, message: &str) -> ReminderOutcome {
        match self.notifier.send(url, message).await {
            Ok(()) => ReminderOutcome::Sent,
            Err(e) => ReminderOutcome::SendFailed(e.to_string()),
        }
    }
}

/// Owns the cron jobs firing the reminders
pub struct ReminderScheduler {
    scheduler: JobScheduler,
}

impl ReminderScheduler {
    /// Register the check-in and check-out jobs and start ticking
    pub async fn start(service: ReminderService) -> anyhow::Result<Self> {
        let scheduler = JobScheduler::new().await?;
        let zone = service.zone();

        let reminders = service.clone();
        let check_in = Job::new_async_tz(CHECK_IN_SCHEDULE, zone, move |_, _| {
            let reminders = reminders.clone();
            Box::pin(async move {
                info!("Running check-in reminder");
                log_outcome("check-in", reminders.check_in_reminder().await);
            })
        })?;
        scheduler.add(check_in).await?;

        for schedule in CHECK_OUT_SCHEDULES {
            let reminders = service.clone();
            let check_out = Job::new_async_tz(schedule, zone, move |_, _| {
                let reminders = reminders.clone();
                Box::pin(async move {
                    info!("Running check-out reminder");
                    log_outcome("check-out", reminders.check_out_reminder().await);
                })
            })?;
            scheduler.add(check_out).await?;
        }

        scheduler.start().await?;
        info!(
            "Started reminder scheduler (check-in {}, check-out {:?}, UTC{})",
            CHECK_IN_SCHEDULE, CHECK_OUT_SCHEDULES, zone
        );

        Ok(Self { scheduler })
    }

    pub async fn shutdown(mut self) -> anyhow::Result<()> {
        self.scheduler.shutdown().await?;
        info!("Reminder scheduler stopped");
        Ok(())
    }
}

fn log_outcome(kind: &str, outcome: ReminderOutcome) {
    match outcome {
        ReminderOutcome::SendFailed(_) => error!("{} reminder finished: {}", kind, outcome),
        _ => info!("{} reminder finished: {}", kind, outcome),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MockAttendanceProvider, MockHolidayProvider, MockNotifier, ProviderError};
    use crate::models::WorkSession;
    use crate::repositories::{MockRepository, sqlite::tests::memory_repository};
    use common::error::DatabaseError;

    const IN_HOOK: &str = "https://ntfy.example.com/in";
    const OUT_HOOK: &str = "https://ntfy.example.com/out";

    fn at(value: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(value).unwrap()
    }

    fn october_13() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 13).unwrap()
    }

    fn webhooks_only() -> WorkConfig {
        WorkConfig {
            check_in_webhook_url: IN_HOOK.to_string(),
            check_out_webhook_url: OUT_HOOK.to_string(),
            ..WorkConfig::default()
        }
    }

    fn with_hr_api() -> WorkConfig {
        WorkConfig {
            check_in_api_url: "https://hr.example.com/attendance".to_string(),
            p_auth: "auth".to_string(),
            p_rtoken: "token".to_string(),
            ..webhooks_only()
        }
    }

    async fn repo_with(config: WorkConfig) -> Arc<dyn Repository> {
        let repo = memory_repository().await;
        repo.save_config(&config).await.unwrap();
        Arc::new(repo)
    }

    fn working_day() -> MockHolidayProvider {
        let mut holidays = MockHolidayProvider::new();
        holidays.expect_is_holiday().returning(|| Ok(false));
        holidays
    }

    fn attendance(status: AttendanceStatus) -> MockAttendanceProvider {
        let mut attendance = MockAttendanceProvider::new();
        attendance
            .expect_fetch_attendance_status()
            .returning(move |_, _| Ok(status));
        attendance
    }

    fn expect_send(url: &'static str, expected: &'static str) -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .withf(move |target, message| target == url && message == expected)
            .times(1)
            .returning(|_, _| Ok(()));
        notifier
    }

    fn server_error() -> ProviderError {
        ProviderError::Status {
            service: "webhook",
            status: 500,
        }
    }

    fn silent() -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier.expect_send().never();
        notifier
    }

    async fn stored_session(repo: &Arc<dyn Repository>) -> Option<WorkSession> {
        repo.get_today_session(october_13()).await.unwrap()
    }

    fn service(
        repo: Arc<dyn Repository>,
        attendance: MockAttendanceProvider,
        holidays: MockHolidayProvider,
        notifier: MockNotifier,
    ) -> ReminderService {
        ReminderService::new(
            repo,
            Arc::new(attendance),
            Arc::new(holidays),
            Arc::new(notifier),
        )
    }

    #[test]
    fn test_reminders_run_in_china_standard_time() {
        assert_eq!(china_standard_time().local_minus_utc(), 8 * 3600);
    }

    #[tokio::test]
    async fn test_check_in_reminder_without_hr_api_is_sent() {
        let mut hr = MockAttendanceProvider::new();
        hr.expect_fetch_attendance_status().never();
        let reminders = service(
            repo_with(webhooks_only()).await,
            hr,
            working_day(),
            expect_send(IN_HOOK, CHECK_IN_MESSAGE),
        );

        assert_eq!(
            reminders.remind_check_in(october_13()).await,
            ReminderOutcome::Sent
        );
    }

    #[tokio::test]
    async fn test_check_in_reminder_without_webhook_does_nothing() {
        let mut holidays = MockHolidayProvider::new();
        holidays.expect_is_holiday().never();
        let reminders = service(
            repo_with(WorkConfig::default()).await,
            MockAttendanceProvider::new(),
            holidays,
            silent(),
        );

        assert_eq!(
            reminders.remind_check_in(october_13()).await,
            ReminderOutcome::Skipped(SkipReason::NoWebhook)
        );
    }

    #[tokio::test]
    async fn test_check_in_reminder_skips_holidays() {
        let mut holidays = MockHolidayProvider::new();
        holidays.expect_is_holiday().returning(|| Ok(true));
        let reminders = service(
            repo_with(with_hr_api()).await,
            MockAttendanceProvider::new(),
            holidays,
            silent(),
        );

        assert_eq!(
            reminders.remind_check_in(october_13()).await,
            ReminderOutcome::Skipped(SkipReason::Holiday)
        );
    }

    #[tokio::test]
    async fn test_holiday_api_failure_counts_as_working_day() {
        let mut holidays = MockHolidayProvider::new();
        holidays
            .expect_is_holiday()
            .returning(|| Err(ProviderError::Parse("not json".to_string())));
        let mut hr = MockAttendanceProvider::new();
        hr.expect_fetch_attendance_status()
            .times(1)
            .returning(|_, _| Ok(AttendanceStatus::default()));
        let reminders = service(
            repo_with(with_hr_api()).await,
            hr,
            holidays,
            expect_send(IN_HOOK, CHECK_IN_MESSAGE),
        );

        assert_eq!(
            reminders.remind_check_in(october_13()).await,
            ReminderOutcome::Sent
        );
    }

    #[tokio::test]
    async fn test_check_in_reminder_skips_when_already_checked_in() {
        let reminders = service(
            repo_with(with_hr_api()).await,
            attendance(AttendanceStatus {
                check_in: Some(at("2025-10-13T09:30:00+08:00")),
                check_out: None,
            }),
            working_day(),
            silent(),
        );

        assert_eq!(
            reminders.remind_check_in(october_13()).await,
            ReminderOutcome::Skipped(SkipReason::AlreadyCheckedIn)
        );
    }

    #[tokio::test]
    async fn test_hr_api_failure_still_reminds() {
        let mut hr = MockAttendanceProvider::new();
        hr.expect_fetch_attendance_status().returning(|_, _| {
            Err(ProviderError::Status {
                service: "HR API",
                status: 503,
            })
        });
        let reminders = service(
            repo_with(with_hr_api()).await,
            hr,
            working_day(),
            expect_send(IN_HOOK, CHECK_IN_MESSAGE),
        );

        assert_eq!(
            reminders.remind_check_in(october_13()).await,
            ReminderOutcome::Sent
        );
    }

    #[tokio::test]
    async fn test_config_failure_does_nothing() {
        let mut repo = MockRepository::new();
        repo.expect_get_config()
            .returning(|| Err(DatabaseError::Migration("locked".to_string())));
        let reminders = service(
            Arc::new(repo),
            MockAttendanceProvider::new(),
            MockHolidayProvider::new(),
            silent(),
        );

        assert_eq!(
            reminders.remind_check_out(october_13()).await,
            ReminderOutcome::Skipped(SkipReason::ConfigUnavailable)
        );
    }

    #[tokio::test]
    async fn test_send_failure_is_reported() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .times(1)
            .returning(|_, _| Err(server_error()));
        let reminders = service(
            repo_with(webhooks_only()).await,
            MockAttendanceProvider::new(),
            working_day(),
            notifier,
        );

        assert_eq!(
            reminders.remind_check_out(october_13()).await,
            ReminderOutcome::SendFailed("webhook returned status 500".to_string())
        );
    }

    #[tokio::test]
    async fn test_check_out_reminder_when_not_clocked_out() {
        let reminders = service(
            repo_with(with_hr_api()).await,
            attendance(AttendanceStatus {
                check_in: Some(at("2025-10-13T09:00:00+08:00")),
                check_out: None,
            }),
            working_day(),
            expect_send(OUT_HOOK, CHECK_OUT_MESSAGE),
        );

        assert_eq!(
            reminders.remind_check_out(october_13()).await,
            ReminderOutcome::Sent
        );
    }

    #[tokio::test]
    async fn test_late_check_out_skips_and_backfills_session() {
        let repo = repo_with(with_hr_api()).await;
        let session = WorkSession::new(at("2025-10-13T09:05:00+08:00"), 480);
        repo.save_session(&session).await.unwrap();
        let reminders = service(
            repo.clone(),
            attendance(AttendanceStatus {
                check_in: Some(at("2025-10-13T09:00:00+08:00")),
                check_out: Some(at("2025-10-13T19:30:00+08:00")),
            }),
            working_day(),
            silent(),
        );

        assert_eq!(
            reminders.remind_check_out(october_13()).await,
            ReminderOutcome::Skipped(SkipReason::AlreadyCheckedOut)
        );
        let stored = stored_session(&repo).await.unwrap();
        assert_eq!(stored.check_out, Some(at("2025-10-13T19:30:00+08:00")));
        assert_eq!(stored.id, session.id);
    }

    #[tokio::test]
    async fn test_failed_backfill_still_skips_late_check_out() {
        let open = WorkSession::new(at("2025-10-13T09:05:00+08:00"), 480);
        let mut repo = MockRepository::new();
        repo.expect_get_config().returning(|| Ok(with_hr_api()));
        repo.expect_get_today_session()
            .returning(move |_| Ok(Some(open.clone())));
        repo.expect_save_session()
            .times(1)
            .returning(|_| Err(DatabaseError::Migration("read-only".to_string())));
        let reminders = service(
            Arc::new(repo),
            attendance(AttendanceStatus {
                check_in: Some(at("2025-10-13T09:00:00+08:00")),
                check_out: Some(at("2025-10-13T19:30:00+08:00")),
            }),
            working_day(),
            silent(),
        );

        assert_eq!(
            reminders.remind_check_out(october_13()).await,
            ReminderOutcome::Skipped(SkipReason::AlreadyCheckedOut)
        );
    }

    #[tokio::test]
    async fn test_early_check_out_still_reminds() {
        let repo = repo_with(with_hr_api()).await;
        let reminders = service(
            repo.clone(),
            attendance(AttendanceStatus {
                check_in: Some(at("2025-10-13T09:00:00+08:00")),
                check_out: Some(at("2025-10-13T12:00:00+08:00")),
            }),
            working_day(),
            expect_send(OUT_HOOK, CHECK_OUT_MESSAGE),
        );

        assert_eq!(
            reminders.remind_check_out(october_13()).await,
            ReminderOutcome::Sent
        );
        assert!(stored_session(&repo).await.is_none());
    }

    #[tokio::test]
    async fn test_backfill_keeps_existing_check_out() {
        let repo = repo_with(with_hr_api()).await;
        let mut session = WorkSession::new(at("2025-10-13T09:00:00+08:00"), 480);
        session.check_out = Some(at("2025-10-13T18:00:00+08:00"));
        repo.save_session(&session).await.unwrap();
        let reminders = service(
            repo.clone(),
            attendance(AttendanceStatus {
                check_in: Some(at("2025-10-13T09:00:00+08:00")),
                check_out: Some(at("2025-10-13T19:30:00+08:00")),
            }),
            working_day(),
            silent(),
        );

        reminders.remind_check_out(october_13()).await;

        let stored = stored_session(&repo).await.unwrap();
        assert_eq!(stored.check_out, Some(at("2025-10-13T18:00:00+08:00")));
    }
}
