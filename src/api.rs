use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, de};
use thiserror::Error;

use crate::{
    config::NetworkConfig,
    hijri::{HijriDate, gregorian_to_hijri},
};

/// Failures of the remote date service. None of these reach the user:
/// callers fall back to the local calendar.
#[derive(Debug, Error)]
pub enum DateServiceError {
    #[error("request to date service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("date service returned error status: {0}")]
    Status(reqwest::StatusCode),
    #[error("date service reported code {0}")]
    Code(u16),
    #[error("malformed date service payload: {0}")]
    Malformed(String),
}

/// Response of the `gToH` endpoint.
#[derive(Debug, Deserialize)]
pub struct GregorianToHijriResponse {
    pub code: u16,
    pub data: Option<ConversionData>,
}

#[derive(Debug, Deserialize)]
pub struct ConversionData {
    pub hijri: HijriPayload,
}

#[derive(Debug, Deserialize)]
pub struct HijriPayload {
    #[serde(deserialize_with = "number_or_string")]
    pub day: u32,
    pub month: HijriMonthPayload,
    #[serde(deserialize_with = "number_or_string")]
    pub year: i64,
}

#[derive(Debug, Deserialize)]
pub struct HijriMonthPayload {
    #[serde(deserialize_with = "number_or_string")]
    pub number: u32,
}

impl GregorianToHijriResponse {
    /// Validate the envelope and extract the date.
    pub fn into_hijri(self) -> Result<HijriDate, DateServiceError> {
        if self.code != 200 {
            return Err(DateServiceError::Code(self.code));
        }
        let hijri = self
            .data
            .ok_or_else(|| DateServiceError::Malformed("missing data".to_string()))?
            .hijri;

        HijriDate::new(hijri.year, hijri.month.number, hijri.day).ok_or_else(|| {
            DateServiceError::Malformed(format!(
                "date out of range: {}-{}-{}",
                hijri.year, hijri.month.number, hijri.day
            ))
        })
    }
}

/// The service sends numbers as JSON strings ("15") in some fields and as
/// integers in others; accept both.
fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    let value = match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n,
        Raw::Text(s) => s.trim().parse::<i64>().map_err(de::Error::custom)?,
    };
    T::try_from(value).map_err(|_| de::Error::custom(format!("{} out of range", value)))
}

/// Client for the Gregorian-to-Hijri conversion service.
#[derive(Clone, Debug)]
pub struct HijriApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl HijriApiClient {
    /// Create a new API client with configurable timeouts.
    pub fn new(base_url: String, network_config: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(network_config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(network_config.connect_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    fn conversion_url(&self, date: NaiveDate) -> String {
        format!(
            "{}/gToH/{}",
            self.base_url.trim_end_matches('/'),
            date.format("%d-%m-%Y")
        )
    }

    /// Ask the service for the Hijri date of `date`.
    pub async fn fetch_hijri(&self, date: NaiveDate) -> Result<HijriDate, DateServiceError> {
        let response = self.client.get(self.conversion_url(date)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DateServiceError::Status(status));
        }

        let body = response.text().await?;
        serde_json::from_str::<GregorianToHijriResponse>(&body)
            .map_err(|e| DateServiceError::Malformed(e.to_string()))?
            .into_hijri()
    }

    /// Remote date when available, otherwise the local tabular conversion.
    /// Never fails and never retries.
    pub async fn resolve(&self, date: NaiveDate) -> HijriDate {
        match self.fetch_hijri(date).await {
            Ok(hijri) => {
                tracing::debug!(%date, %hijri, "Hijri date from date service");
                hijri
            }
            Err(e) => {
                tracing::warn!(%date, error = %e, "Date service unavailable, using local calendar");
                gregorian_to_hijri(date)
            }
        }
    }
}

/// Resolve with an optional client; `None` means offline.
pub async fn resolve_hijri(client: Option<&HijriApiClient>, date: NaiveDate) -> HijriDate {
    match client {
        Some(client) => client.resolve(date).await,
        None => gregorian_to_hijri(date),
    }
}
