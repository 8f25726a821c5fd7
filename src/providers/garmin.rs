// ABOUTME: Garmin Connect body-composition uploader behind the MeasurementUploader trait
// ABOUTME: Exchanges account credentials for a bearer token and posts the weight-service payload
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Garmin Connect uploader.
//!
//! The reconciliation engine treats the target side as opaque: one call in,
//! success or a structured failure reason out. Accordingly every failure on
//! this path, transport included, is reduced to [`SyncError::Upload`] rather
//! than leaking Garmin-specific response shapes upward.

use crate::errors::{Result, SyncError};
use crate::models::Measurement;
use crate::providers::core::MeasurementUploader;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Production Connect API base URL
pub const CONNECT_API_BASE: &str = "https://connectapi.garmin.com";

/// Token exchange path relative to the API base
const TOKEN_ENDPOINT: &str = "oauth-service/oauth/access_token";

/// Weight service path relative to the API base
const UPLOAD_ENDPOINT: &str = "weight-service/user-weight";

/// Connection settings for the Garmin Connect API
#[derive(Debug, Clone)]
pub struct GarminConfig {
    /// API base URL; overridable for tests
    pub base_url: String,
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

impl GarminConfig {
    /// Configuration against the production API
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            base_url: CONNECT_API_BASE.to_owned(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Uploader posting one body-composition record per call
pub struct GarminUploader {
    config: GarminConfig,
    client: Client,
    access_token: Option<String>,
}

impl GarminUploader {
    /// Create an uploader for the configured account, reusing the given HTTP
    /// client and its timeouts
    #[must_use]
    pub fn new(config: GarminConfig, client: Client) -> Self {
        Self {
            config,
            client,
            access_token: None,
        }
    }

    async fn ensure_token(&mut self) -> Result<String> {
        if let Some(token) = &self.access_token {
            return Ok(token.clone());
        }

        let url = format!("{}/{TOKEN_ENDPOINT}", self.config.base_url);
        let params = [
            ("username", self.config.email.as_str()),
            ("password", self.config.password.as_str()),
            ("grant_type", "password"),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| SyncError::Upload(format!("garmin token request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Upload(format!(
                "garmin token exchange rejected with status {status}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Upload(format!("garmin token response: {e}")))?;

        info!("garmin token obtained");
        self.access_token = Some(token.access_token.clone());
        Ok(token.access_token)
    }
}

#[async_trait]
impl MeasurementUploader for GarminUploader {
    async fn upload(&mut self, measurement: &Measurement) -> Result<()> {
        let token = self.ensure_token().await?;
        let url = format!("{}/{UPLOAD_ENDPOINT}", self.config.base_url);
        let payload = BodyCompositionRequest::from(measurement);
        debug!(date = %measurement.date, "posting body composition to garmin");

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SyncError::Upload(format!("garmin upload request: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            // Token may have been revoked server-side; drop it so the next
            // cycle re-authenticates.
            warn!(%status, "garmin rejected the cached token");
            self.access_token = None;
            return Err(SyncError::Upload(format!(
                "garmin rejected the upload token with status {status}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Upload(format!(
                "garmin upload failed with status {status}: {body}"
            )));
        }

        info!(date = %measurement.date, "garmin upload accepted");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Weight-service payload; absent metrics are omitted, never zeroed
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BodyCompositionRequest {
    date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    percent_fat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    percent_hydration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bone_mass: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    muscle_mass: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    visceral_fat: Option<f64>,
}

impl From<&Measurement> for BodyCompositionRequest {
    fn from(m: &Measurement) -> Self {
        Self {
            date: m.date.format("%Y-%m-%d").to_string(),
            weight: m.weight_kg,
            percent_fat: m.body_fat_pct,
            percent_hydration: m.water_pct,
            bone_mass: m.bone_mass_kg,
            muscle_mass: m.muscle_mass_kg,
            visceral_fat: m.visceral_fat,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn payload_omits_absent_metrics() {
        let m = Measurement {
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            weight_kg: Some(70.2),
            body_fat_pct: None,
            water_pct: Some(55.0),
            bone_mass_kg: None,
            muscle_mass_kg: None,
            visceral_fat: None,
        };

        let json = serde_json::to_value(BodyCompositionRequest::from(&m)).unwrap();
        assert_eq!(json["date"], "2025-06-02");
        assert_eq!(json["weight"], 70.2);
        assert_eq!(json["percentHydration"], 55.0);
        assert!(json.get("percentFat").is_none());
        assert!(json.get("boneMass").is_none());
    }
}
