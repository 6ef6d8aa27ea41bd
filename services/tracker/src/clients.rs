//! Outbound collaborators: HR attendance, holiday calendar and webhook notifications

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use std::time::Duration;
use thiserror::Error;

use crate::models::WorkConfig;

pub mod holiday;
pub mod hr_api;
pub mod webhook;

pub use holiday::HolidayApiClient;
pub use hr_api::HrApiClient;
pub use webhook::WebhookClient;

/// Timeout applied to every outbound request unless configured otherwise
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure of a remote provider call
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The HR API URL or one of its tokens is missing
    #[error("HR API not properly configured")]
    NotConfigured,

    /// Notification target is empty
    #[error("webhook URL is empty")]
    EmptyUrl,

    /// Transport failure or timeout
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote answered with a non-success HTTP status
    #[error("{service} returned status {status}")]
    Status { service: &'static str, status: u16 },

    /// Remote answered 2xx but reported a failure in its payload
    #[error("API error (code {code}): {message}")]
    Api { code: String, message: String },

    /// Payload could not be understood
    #[error("failed to parse response: {0}")]
    Parse(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Attendance recorded by the HR system for one date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceStatus {
    pub check_in: Option<DateTime<FixedOffset>>,
    pub check_out: Option<DateTime<FixedOffset>>,
}

impl AttendanceStatus {
    pub fn has_checked_in(&self) -> bool {
        self.check_in.is_some()
    }
}

/// Source of attendance records for auto-fetch and reminders
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttendanceProvider: Send + Sync {
    async fn fetch_attendance_status(
        &self,
        config: &WorkConfig,
        date: NaiveDate,
    ) -> ProviderResult<AttendanceStatus>;
}

/// Tells whether today is a rest day
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HolidayProvider: Send + Sync {
    async fn is_holiday(&self) -> ProviderResult<bool>;
}

/// Delivers a reminder message to a webhook URL
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, url: &str, message: &str) -> ProviderResult<()>;
}

/// Shared HTTP client builder with a bounded request time
pub fn http_client(timeout: Duration) -> ProviderResult<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}
