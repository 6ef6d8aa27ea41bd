//! Request and response payloads of the HTTP API

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{MonthlyStats, WorkConfig, YearMonth};

/// Request for check-in
#[derive(Debug, Clone, Deserialize)]
pub struct CheckInRequest {
    pub check_in_time: DateTime<FixedOffset>,
}

/// Request for check-out
#[derive(Debug, Clone, Deserialize)]
pub struct CheckOutRequest {
    pub check_out_time: DateTime<FixedOffset>,
}

/// Configuration update request.
///
/// `work_hours` is in minutes and only applied when positive; every other
/// field replaces the stored value as-is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigRequest {
    pub work_hours: i64,
    pub check_in_api_url: String,
    pub auto_fetch_enabled: bool,
    pub p_auth: String,
    pub p_rtoken: String,
    pub check_in_webhook_url: String,
    pub check_out_webhook_url: String,
}

/// Request to read or auto-fetch the check-in of a date
#[derive(Debug, Clone, Deserialize)]
pub struct TodayCheckInRequest {
    pub date: NaiveDate,
    /// Skip the stored session and ask the HR API again
    #[serde(default)]
    pub re_check_in: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckInResponse {
    pub session_id: Uuid,
    pub check_in_time: DateTime<FixedOffset>,
    pub expected_check_out_time: DateTime<FixedOffset>,
    pub work_hours: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckOutResponse {
    pub session_id: Uuid,
    pub check_in_time: DateTime<FixedOffset>,
    pub check_out_time: DateTime<FixedOffset>,
    pub overtime_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigResponse {
    pub work_hours: i64,
    pub check_in_api_url: String,
    pub auto_fetch_enabled: bool,
    pub p_auth: String,
    pub p_rtoken: String,
    pub check_in_webhook_url: String,
    pub check_out_webhook_url: String,
}

impl From<WorkConfig> for ConfigResponse {
    fn from(config: WorkConfig) -> Self {
        Self {
            work_hours: config.default_work_minutes,
            check_in_api_url: config.check_in_api_url,
            auto_fetch_enabled: config.auto_fetch_enabled,
            p_auth: config.p_auth,
            p_rtoken: config.p_rtoken,
            check_in_webhook_url: config.check_in_webhook_url,
            check_out_webhook_url: config.check_out_webhook_url,
        }
    }
}

/// Current work status
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub has_checked_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_out_time: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_check_out_time: Option<DateTime<FixedOffset>>,
    pub current_time: DateTime<FixedOffset>,
    pub work_hours: i64,
    pub is_check_out_time: bool,
    pub overtime_minutes: i64,
}

/// Check-in status of a date, possibly fetched from the HR API.
///
/// Fetch and save failures are reported through `api_error` instead of an
/// HTTP error so the caller can always render the result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayCheckInResponse {
    pub has_checked_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<DateTime<FixedOffset>>,
    pub can_auto_fetch: bool,
    pub auto_fetch_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthStats {
    pub year_month: YearMonth,
    pub total_days: usize,
    pub checked_out_days: usize,
    pub overtime_minutes: i64,
}

impl From<MonthlyStats> for MonthStats {
    fn from(stats: MonthlyStats) -> Self {
        Self {
            year_month: stats.year_month,
            total_days: stats.total_days,
            checked_out_days: stats.checked_out_days,
            overtime_minutes: stats.overtime_minutes,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyStatsResponse {
    pub current_month: MonthStats,
    pub last_month: MonthStats,
}
