// ABOUTME: Renpho Health cloud client with encrypted envelopes and cached login sessions
// ABOUTME: Fetches the daily body-composition summary and maps it into a normalized Measurement
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Renpho Health cloud API client.
//!
//! Every request body is serialized to compact JSON, sealed by the
//! [`EnvelopeCodec`], and posted as `{"encryptData": "<base64>"}`. Responses
//! arrive as `{ code, msg, data }` where `code == 101` signals success and
//! `data` is another envelope whose plaintext is JSON.
//!
//! The client owns the login session exclusively: it logs in lazily, reuses
//! the token until a conservative lease expires, and discards the session on
//! any server-side rejection so the next call re-authenticates.

use crate::crypto::EnvelopeCodec;
use crate::errors::{Result, SyncError};
use crate::models::Measurement;
use crate::providers::core::MeasurementSource;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

/// Shared AES key baked into the Renpho mobile app (wire compatibility constant)
pub const ENCRYPTION_KEY: &[u8] = b"ed*wijdi$h6fe3ew";

/// Production API base URL
pub const API_BASE_URL: &str = "https://cloud.renpho.com";

/// App version advertised in headers and the login payload
const APP_VERSION: &str = "7.5.0";

/// Login endpoint path
const LOGIN_ENDPOINT: &str = "renpho-aggregation/user/login";

/// Daily health summary endpoint; returns the latest measurement payload
const DAILY_SUMMARY_ENDPOINT: &str = "RenphoHealth/healthManage/dailyCalories";

/// Scale device types requested in the login binding list
const DEVICE_TYPES: [&str; 7] = ["02D3", "02D5", "0B18", "0B38", "0B58", "0B78", "0BA6"];

/// Success code in the response envelope
const API_SUCCESS_CODE: i64 = 101;

/// Timestamps above this are milliseconds rather than seconds
const MILLIS_THRESHOLD: f64 = 4_000_000_000.0;

/// Conservative token lease; the API does not communicate expiry
const SESSION_LEASE_HOURS: i64 = 6;

/// Connection settings for the Renpho cloud API
#[derive(Debug, Clone)]
pub struct RenphoConfig {
    /// API base URL; overridable for tests
    pub base_url: String,
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
    /// Timezone used for "today" and for normalizing record timestamps
    pub timezone: Tz,
}

impl RenphoConfig {
    /// Configuration against the production API
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>, timezone: Tz) -> Self {
        Self {
            base_url: API_BASE_URL.to_owned(),
            email: email.into(),
            password: password.into(),
            timezone,
        }
    }
}

/// Cached authentication state, owned exclusively by the client
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque credential token sent on subsequent requests
    pub token: String,
    /// Numeric account id sent alongside the token
    pub user_id: i64,
    /// When the session was created
    pub issued_at: DateTime<Utc>,
}

impl Session {
    /// Whether the conservative fixed lease has elapsed
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.issued_at >= chrono::Duration::hours(SESSION_LEASE_HOURS)
    }
}

/// Authenticated Renpho cloud client
pub struct RenphoClient {
    config: RenphoConfig,
    codec: EnvelopeCodec,
    client: Client,
    session: Option<Session>,
}

impl RenphoClient {
    /// Create a client for the configured account, reusing the given HTTP
    /// client and its timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Crypto`] if the compiled-in key material is
    /// malformed.
    pub fn new(config: RenphoConfig, client: Client) -> Result<Self> {
        let codec = EnvelopeCodec::new(ENCRYPTION_KEY)?;
        Ok(Self {
            config,
            codec,
            client,
            session: None,
        })
    }

    /// Currently cached session, if any
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Discard the cached session so the next call re-authenticates
    pub fn invalidate_session(&mut self) {
        self.session = None;
    }

    /// Today's calendar date in the configured timezone
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.config.timezone).date_naive()
    }

    fn utc_offset_hours(&self) -> i32 {
        self.config
            .timezone
            .offset_from_utc_datetime(&Utc::now().naive_utc())
            .fix()
            .local_minus_utc()
            / 3600
    }

    /// Log in if no usable session is cached. Idempotent-safe to call before
    /// every request.
    async fn ensure_session(&mut self) -> Result<()> {
        if self
            .session
            .as_ref()
            .is_some_and(|s| !s.is_expired(Utc::now()))
        {
            return Ok(());
        }
        self.session = None;

        let session = self.login().await?;
        info!(user_id = session.user_id, "renpho login successful");
        self.session = Some(session);
        Ok(())
    }

    async fn login(&self) -> Result<Session> {
        let payload = json!({
            "questionnaire": {},
            "login": {
                "email": self.config.email,
                "password": self.config.password,
                "areaCode": "US",
                "appRevision": APP_VERSION,
                "cellphoneType": "renpho-garmin-sync",
                "systemType": "11",
                "platform": "android",
            },
            "bindingList": { "deviceTypes": DEVICE_TYPES },
        });

        let value = self.api_call(LOGIN_ENDPOINT, &payload).await?;
        let response: LoginResponse = serde_json::from_value(value)
            .map_err(|e| SyncError::Parse(format!("login response: {e}")))?;

        let login = response
            .login
            .ok_or_else(|| SyncError::Parse("login response missing 'login' block".into()))?;
        let token = login
            .token
            .ok_or_else(|| SyncError::Parse("login response missing token".into()))?;
        let user_id = login
            .id
            .ok_or_else(|| SyncError::Parse("login response missing user id".into()))?;

        Ok(Session {
            token,
            user_id,
            issued_at: Utc::now(),
        })
    }

    /// Seal a payload, post it, and unseal the response.
    ///
    /// A non-success envelope code is an authentication-class rejection: the
    /// API uses it both for bad credentials at login and for expired tokens on
    /// later calls.
    async fn api_call(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let url = format!("{}/{endpoint}", self.config.base_url);
        let plaintext = serde_json::to_string(payload)?;
        let body = serde_json::to_string(&json!({
            "encryptData": self.codec.encrypt(plaintext.as_bytes()),
        }))?;

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json;charset=UTF-8")
            .header("language", "en")
            .header("appVersion", APP_VERSION)
            .header("platform", "android")
            .header("area", "US")
            .header("timeZone", self.utc_offset_hours().to_string())
            .header("systemVersion", "16")
            .header("languageCode", "en")
            .header("userArea", "US")
            .body(body);

        if let Some(session) = &self.session {
            request = request
                .header("token", &session.token)
                .header("userId", session.user_id.to_string());
        }

        let response = request.send().await?.error_for_status()?;
        let text = response.text().await?;
        let envelope: ApiEnvelope = serde_json::from_str(&text)
            .map_err(|e| SyncError::Parse(format!("response envelope: {e}")))?;

        if envelope.code != API_SUCCESS_CODE {
            let msg = envelope.msg.unwrap_or_else(|| "unknown error".to_owned());
            return Err(SyncError::Auth(format!(
                "api code {}: {msg}",
                envelope.code
            )));
        }

        match envelope.data {
            Some(data) if !data.is_empty() => {
                let decrypted = self.codec.decrypt_string(&data)?;
                serde_json::from_str(&decrypted)
                    .map_err(|e| SyncError::Parse(format!("decrypted payload: {e}")))
            }
            _ => Ok(serde_json::Value::Object(serde_json::Map::new())),
        }
    }

    async fn fetch_summary(&mut self, date: NaiveDate) -> Result<Option<Measurement>> {
        self.ensure_session().await?;
        let payload = json!({ "data": date.format("%Y-%m-%d").to_string() });
        let value = self.api_call(DAILY_SUMMARY_ENDPOINT, &payload).await?;
        measurement_from_summary(&value, self.config.timezone)
    }
}

#[async_trait]
impl MeasurementSource for RenphoClient {
    /// Fetch today's summary, re-authenticating once if the server rejects a
    /// cached session (server-side expiry the lease did not predict).
    async fn fetch_today(&mut self) -> Result<Option<Measurement>> {
        let today = self.today();
        let had_cached_session = self
            .session
            .as_ref()
            .is_some_and(|s| !s.is_expired(Utc::now()));

        match self.fetch_summary(today).await {
            Err(SyncError::Auth(reason)) if had_cached_session => {
                warn!(%reason, "renpho rejected cached session, re-authenticating");
                self.invalidate_session();
                self.fetch_summary(today).await
            }
            other => other,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    code: i64,
    msg: Option<String>,
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    login: Option<LoginData>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: Option<String>,
    id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailySummary {
    four_electrode_weight: Option<WeightRecord>,
    eight_electrode_weight: Option<WeightRecord>,
}

/// Raw summary block; the API mixes camelCase and lowercase keys
#[derive(Debug, Deserialize)]
struct WeightRecord {
    weight: Option<f64>,
    bodyfat: Option<f64>,
    water: Option<f64>,
    bone: Option<f64>,
    muscle: Option<f64>,
    visfat: Option<f64>,
    #[serde(rename = "localCreatedAt")]
    local_created_at: Option<f64>,
}

/// Map a decrypted daily-summary payload into a normalized measurement.
///
/// Returns `Ok(None)` when no summary block is present, when the block has no
/// timestamp to date it, or when no metric carries a value. A payload that
/// does not match the expected structure at all is a parse error, distinct
/// from "no data yet".
fn measurement_from_summary(value: &serde_json::Value, timezone: Tz) -> Result<Option<Measurement>> {
    let summary: DailySummary = serde_json::from_value(value.clone())
        .map_err(|e| SyncError::Parse(format!("daily summary: {e}")))?;

    // Four-electrode scales take precedence when both blocks are present
    let Some(record) = summary
        .four_electrode_weight
        .or(summary.eight_electrode_weight)
    else {
        debug!("daily summary carries no weight block");
        return Ok(None);
    };

    let Some(raw_ts) = record.local_created_at else {
        debug!("weight block carries no localCreatedAt timestamp");
        return Ok(None);
    };

    let seconds = if raw_ts > MILLIS_THRESHOLD {
        raw_ts / 1_000.0
    } else {
        raw_ts
    };
    let date = Utc
        .timestamp_opt(seconds as i64, 0)
        .single()
        .ok_or_else(|| SyncError::Parse(format!("localCreatedAt {raw_ts} out of range")))?
        .with_timezone(&timezone)
        .date_naive();

    let measurement = Measurement {
        date,
        weight_kg: record.weight,
        body_fat_pct: record.bodyfat,
        water_pct: record.water,
        bone_mass_kg: record.bone,
        muscle_mass_kg: record.muscle,
        visceral_fat: record.visfat,
    };

    if measurement.has_metrics() {
        Ok(Some(measurement))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use chrono_tz::Tz;

    fn ts(y: i32, mo: u32, d: u32, h: u32) -> f64 {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap().timestamp() as f64
    }

    #[test]
    fn maps_four_electrode_block() {
        let payload = json!({
            "fourElectrodeWeight": {
                "weight": 70.2,
                "bodyfat": 18.5,
                "water": 55.1,
                "bone": 3.2,
                "muscle": 54.0,
                "visfat": 7.0,
                "localCreatedAt": ts(2025, 6, 2, 12),
            }
        });

        let m = measurement_from_summary(&payload, Tz::UTC).unwrap().unwrap();
        assert_eq!(m.date, NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        assert_eq!(m.weight_kg, Some(70.2));
        assert_eq!(m.visceral_fat, Some(7.0));
    }

    #[test]
    fn falls_back_to_eight_electrode_block() {
        let payload = json!({
            "eightElectrodeWeight": {
                "weight": 81.0,
                "localCreatedAt": ts(2025, 6, 2, 8),
            }
        });

        let m = measurement_from_summary(&payload, Tz::UTC).unwrap().unwrap();
        assert_eq!(m.weight_kg, Some(81.0));
        assert_eq!(m.body_fat_pct, None);
    }

    #[test]
    fn millisecond_timestamps_are_normalized() {
        let payload = json!({
            "fourElectrodeWeight": {
                "weight": 70.0,
                "localCreatedAt": ts(2025, 6, 2, 12) * 1_000.0,
            }
        });

        let m = measurement_from_summary(&payload, Tz::UTC).unwrap().unwrap();
        assert_eq!(m.date, NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
    }

    #[test]
    fn record_date_is_normalized_to_configured_timezone() {
        // 03:00 UTC on June 2 is still June 1 in Chicago (UTC-5 in summer)
        let payload = json!({
            "fourElectrodeWeight": {
                "weight": 70.0,
                "localCreatedAt": ts(2025, 6, 2, 3),
            }
        });

        let m = measurement_from_summary(&payload, chrono_tz::America::Chicago)
            .unwrap()
            .unwrap();
        assert_eq!(m.date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    }

    #[test]
    fn missing_weight_block_is_not_available() {
        let payload = json!({ "someOtherField": 1 });
        assert!(measurement_from_summary(&payload, Tz::UTC)
            .unwrap()
            .is_none());
    }

    #[test]
    fn block_without_timestamp_is_not_available() {
        let payload = json!({ "fourElectrodeWeight": { "weight": 70.0 } });
        assert!(measurement_from_summary(&payload, Tz::UTC)
            .unwrap()
            .is_none());
    }

    #[test]
    fn block_without_metrics_is_not_available() {
        let payload = json!({
            "fourElectrodeWeight": { "localCreatedAt": ts(2025, 6, 2, 12) }
        });
        assert!(measurement_from_summary(&payload, Tz::UTC)
            .unwrap()
            .is_none());
    }

    #[test]
    fn malformed_block_is_a_parse_error() {
        let payload = json!({ "fourElectrodeWeight": "not an object" });
        let err = measurement_from_summary(&payload, Tz::UTC).unwrap_err();
        assert!(matches!(err, SyncError::Parse(_)));
    }

    #[test]
    fn session_expires_after_lease() {
        let session = Session {
            token: "t".into(),
            user_id: 1,
            issued_at: Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap(),
        };
        let within = Utc.with_ymd_and_hms(2025, 6, 2, 5, 59, 0).unwrap();
        let past = Utc.with_ymd_and_hms(2025, 6, 2, 6, 0, 1).unwrap();
        assert!(!session.is_expired(within));
        assert!(session.is_expired(past));
    }
}
