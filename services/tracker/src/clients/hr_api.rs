//! Client for the HR attendance API

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

use crate::clients::{
    AttendanceProvider, AttendanceStatus, ProviderError, ProviderResult, http_client,
};
use crate::models::{WorkConfig, china_standard_time};

/// HR API response envelope
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HrAttendanceInfo {
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Vec<AttendanceRecord>,
}

/// One day of attendance as reported by the HR API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    /// `YYYY-MM-DD`
    pub attendance_date: String,
    /// `HH:MM`, wall-clock time in China Standard Time
    pub first_clock_in_time: Option<String>,
    pub last_clock_out_time: Option<String>,
}

/// HR attendance API client
#[derive(Clone)]
pub struct HrApiClient {
    http: reqwest::Client,
}

impl HrApiClient {
    pub fn new(timeout: Duration) -> ProviderResult<Self> {
        Ok(Self {
            http: http_client(timeout)?,
        })
    }

    async fn fetch_records(
        &self,
        config: &WorkConfig,
        date: NaiveDate,
    ) -> ProviderResult<Vec<AttendanceRecord>> {
        let url = build_api_url(&config.check_in_api_url, date);
        info!("Fetching attendance: {}", url);

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json, text/plain, */*")
            .header("Accept-Language", "en-CN,en;q=0.9,zh-CN;q=0.8,zh;q=0.7")
            .header("Lang-Code", "en")
            .header("P-Auth", &config.p_auth)
            .header("P-Rtoken", &config.p_rtoken)
            .send()
            .await?;

        let status = response.status();
        info!("HR API response status: {}", status);
        if !status.is_success() {
            return Err(ProviderError::Status {
                service: "HR API",
                status: status.as_u16(),
            });
        }

        let info: HrAttendanceInfo = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        info!(
            "HR API response code {}, success {}, message {:?}, {} records",
            info.code,
            info.success,
            info.message,
            info.data.len()
        );

        if info.code != "200" || !info.success {
            return Err(ProviderError::Api {
                code: info.code,
                message: info.message,
            });
        }

        Ok(info.data)
    }
}

#[async_trait]
impl AttendanceProvider for HrApiClient {
    async fn fetch_attendance_status(
        &self,
        config: &WorkConfig,
        date: NaiveDate,
    ) -> ProviderResult<AttendanceStatus> {
        if !config.has_api_config() {
            return Err(ProviderError::NotConfigured);
        }

        let records = self.fetch_records(config, date).await?;
        let status = attendance_for_date(&records, date)?;

        info!(
            "Attendance for {}: check-in {:?}, check-out {:?}",
            date, status.check_in, status.check_out
        );
        Ok(status)
    }
}

/// Append `monthly=YYYY-MM` to the base URL unless it is already there
pub fn build_api_url(base_url: &str, date: NaiveDate) -> String {
    if base_url.contains("monthly=") {
        return base_url.to_string();
    }

    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{}{}monthly={}", base_url, separator, date.format("%Y-%m"))
}

/// Pick the record of `date` and turn its clock times into instants.
///
/// A date with no record means nothing was clocked yet.
pub fn attendance_for_date(
    records: &[AttendanceRecord],
    date: NaiveDate,
) -> ProviderResult<AttendanceStatus> {
    let day = date.format("%Y-%m-%d").to_string();
    let Some(record) = records.iter().find(|r| r.attendance_date == day) else {
        info!("No attendance record found for date: {}", date);
        return Ok(AttendanceStatus::default());
    };

    Ok(AttendanceStatus {
        check_in: parse_clock_time(date, record.first_clock_in_time.as_deref())?,
        check_out: parse_clock_time(date, record.last_clock_out_time.as_deref())?,
    })
}

/// `HH:MM` on `date`, read as China Standard Time
pub fn parse_clock_time(
    date: NaiveDate,
    clock: Option<&str>,
) -> ProviderResult<Option<DateTime<FixedOffset>>> {
    let clock = match clock.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(clock) => clock,
    };

    let time = NaiveTime::parse_from_str(clock, "%H:%M")
        .map_err(|e| ProviderError::Parse(format!("invalid clock time {:?}: {}", clock, e)))?;

    china_standard_time()
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(Some)
        .ok_or_else(|| ProviderError::Parse(format!("ambiguous clock time {:?}", clock)))
}
