//! Domain models for work sessions, configuration and monthly statistics

use chrono::{DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod dto;

pub const MINUTES_PER_HOUR: i64 = 60;
/// 8 hours, the configured duration a fresh database starts with
pub const STANDARD_WORK_MINUTES: i64 = 8 * MINUTES_PER_HOUR;
/// Overtime is always measured against 10 hours, whatever the configured duration
pub const OVERTIME_THRESHOLD_MINUTES: i64 = 10 * MINUTES_PER_HOUR;
pub const MAX_WORK_MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;

/// Identifier of the single configuration row
pub const CONFIG_ID: &str = "default";

const CHINA_UTC_OFFSET_SECONDS: i32 = 8 * 3600;

/// China Standard Time (UTC+8), falling back to the host offset
pub fn china_standard_time() -> FixedOffset {
    FixedOffset::east_opt(CHINA_UTC_OFFSET_SECONDS)
        .unwrap_or_else(|| *Local::now().offset())
}

/// When someone is expected to leave after checking in at `check_in`
pub fn expected_check_out(
    check_in: DateTime<FixedOffset>,
    work_minutes: i64,
) -> DateTime<FixedOffset> {
    check_in + Duration::minutes(work_minutes)
}

/// A single work session for a specific date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSession {
    pub id: Uuid,
    pub date: NaiveDate,
    pub check_in: DateTime<FixedOffset>,
    pub check_out: Option<DateTime<FixedOffset>>,
    /// Expected work duration in minutes, copied from the config
    pub work_minutes: i64,
}

impl WorkSession {
    /// Start a new session on the date of `check_in`
    pub fn new(check_in: DateTime<FixedOffset>, work_minutes: i64) -> Self {
        Self::with_id(
            Uuid::new_v4(),
            check_in.date_naive(),
            check_in,
            work_minutes,
        )
    }

    pub fn with_id(
        id: Uuid,
        date: NaiveDate,
        check_in: DateTime<FixedOffset>,
        work_minutes: i64,
    ) -> Self {
        Self {
            id,
            date,
            check_in,
            check_out: None,
            work_minutes,
        }
    }

    /// Reset the session to a fresh check-in, dropping any check-out
    pub fn check_in_again(&mut self, check_in: DateTime<FixedOffset>, work_minutes: i64) {
        self.check_in = check_in;
        self.work_minutes = work_minutes;
        self.check_out = None;
    }

    pub fn has_checked_out(&self) -> bool {
        self.check_out.is_some()
    }

    pub fn expected_check_out(&self) -> DateTime<FixedOffset> {
        expected_check_out(self.check_in, self.work_minutes)
    }

    /// Whole minutes between check-in and check-out, 0 while still checked in
    pub fn actual_work_minutes(&self) -> i64 {
        match self.check_out {
            Some(check_out) => (check_out - self.check_in).num_minutes(),
            None => 0,
        }
    }

    /// Minutes worked beyond the 10-hour threshold.
    ///
    /// Positive for overtime, negative for under-time, 0 while still
    /// checked in.
    pub fn overtime_minutes(&self) -> i64 {
        if !self.has_checked_out() {
            return 0;
        }
        self.actual_work_minutes() - OVERTIME_THRESHOLD_MINUTES
    }
}

/// The global work configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkConfig {
    pub id: String,
    pub default_work_minutes: i64,
    /// HR API endpoint used to fetch attendance
    pub check_in_api_url: String,
    pub auto_fetch_enabled: bool,
    /// `P-Auth` header for the HR API
    pub p_auth: String,
    /// `P-Rtoken` header for the HR API
    pub p_rtoken: String,
    pub check_in_webhook_url: String,
    pub check_out_webhook_url: String,
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            id: CONFIG_ID.to_string(),
            default_work_minutes: STANDARD_WORK_MINUTES,
            check_in_api_url: String::new(),
            auto_fetch_enabled: false,
            p_auth: String::new(),
            p_rtoken: String::new(),
            check_in_webhook_url: String::new(),
            check_out_webhook_url: String::new(),
        }
    }
}

impl WorkConfig {
    /// True when the HR API URL and both tokens are set
    pub fn has_api_config(&self) -> bool {
        !self.check_in_api_url.is_empty() && !self.p_auth.is_empty() && !self.p_rtoken.is_empty()
    }

    pub fn should_auto_fetch(&self) -> bool {
        self.auto_fetch_enabled && self.has_api_config()
    }
}

/// A calendar month, displayed as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// The month `date` falls in
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Aggregated statistics for a month
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyStats {
    pub year_month: YearMonth,
    pub total_days: usize,
    pub checked_out_days: usize,
    /// Sum of positive overtime only; short days do not offset long ones
    pub overtime_minutes: i64,
}

impl MonthlyStats {
    pub fn aggregate(sessions: &[WorkSession], year_month: YearMonth) -> Self {
        let checked_out = sessions.iter().filter(|s| s.has_checked_out());
        let checked_out_days = checked_out.clone().count();
        let overtime_minutes: i64 = checked_out.map(|s| s.overtime_minutes().max(0)).sum();

        Self {
            year_month,
            total_days: sessions.len(),
            checked_out_days,
            overtime_minutes,
        }
    }
}
