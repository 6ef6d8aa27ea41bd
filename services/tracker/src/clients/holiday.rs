//! Client for the public holiday calendar

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

use crate::clients::{HolidayProvider, ProviderError, ProviderResult, http_client};

pub const DEFAULT_HOLIDAY_API_URL: &str = "http://api.haoshenqi.top/holiday/today";
pub const HOLIDAY_STATUS_REST: &str = "休息";

#[derive(Debug, Deserialize)]
pub struct HolidayResponse {
    #[serde(default)]
    pub code: i64,
    pub data: HolidayDay,
}

#[derive(Debug, Deserialize)]
pub struct HolidayDay {
    #[serde(default)]
    pub date: String,
    /// `休息` on rest days, `工作` on working days
    pub status: String,
}

impl HolidayResponse {
    pub fn is_rest_day(&self) -> bool {
        self.data.status == HOLIDAY_STATUS_REST
    }
}

/// Holiday calendar API client
#[derive(Clone)]
pub struct HolidayApiClient {
    http: reqwest::Client,
    api_url: String,
}

impl HolidayApiClient {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> ProviderResult<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            api_url: api_url.into(),
        })
    }
}

#[async_trait]
impl HolidayProvider for HolidayApiClient {
    async fn is_holiday(&self) -> ProviderResult<bool> {
        info!("Checking holiday status: {}", self.api_url);

        let response = self.http.get(&self.api_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                service: "holiday API",
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        info!("Holiday API response: {}", body);

        let holiday: HolidayResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Parse(e.to_string()))?;

        let is_holiday = holiday.is_rest_day();
        info!(
            "Holiday status {} (is holiday: {})",
            holiday.data.status, is_holiday
        );
        Ok(is_holiday)
    }
}
