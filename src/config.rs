// ABOUTME: Environment-based configuration for credentials, schedule, and timezone
// ABOUTME: Typed from_env constructors with validation and redacted operator summary
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Environment-based configuration for the sync service.
//!
//! All options come from environment variables. Both credential pairs are
//! required; the schedule defaults to 03:00 in UTC when `SYNC_TIME` and
//! `SYNC_TIMEZONE` are unset.

use crate::errors::{Result, SyncError};
use chrono::NaiveTime;
use chrono_tz::Tz;
use reqwest::{Client, ClientBuilder};
use std::env;
use std::time::Duration;

/// Default daily trigger time when `SYNC_TIME` is unset
pub const DEFAULT_SYNC_TIME: &str = "03:00";

/// Default timezone identifier when `SYNC_TIMEZONE` is unset
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Credentials for the Renpho Health cloud account
#[derive(Debug, Clone)]
pub struct RenphoCredentials {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

/// Credentials for the Garmin Connect account
#[derive(Debug, Clone)]
pub struct GarminCredentials {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

/// Timeouts applied to every outbound HTTP request
#[derive(Debug, Clone, Copy)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Connection establishment timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl HttpConfig {
    /// Build the HTTP client both provider clients share.
    ///
    /// Every network round trip of a cycle (login, fetch, upload) goes through
    /// one client built here, so these timeouts are the upper bound on how
    /// long a cycle can block on any single request.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Transport`] if the TLS backend cannot be
    /// initialized.
    pub fn build_client(&self) -> Result<Client> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .build()?;
        Ok(client)
    }
}

/// Complete service configuration assembled from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Source provider credentials
    pub renpho: RenphoCredentials,
    /// Target provider credentials
    pub garmin: GarminCredentials,
    /// Local wall-clock time of the daily trigger
    pub sync_time: NaiveTime,
    /// Timezone the service observes for "today" and the daily trigger
    pub timezone: Tz,
    /// HTTP timeout settings
    pub http: HttpConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] when a required credential is missing or
    /// `SYNC_TIME` / `SYNC_TIMEZONE` cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let renpho = RenphoCredentials {
            email: required_env("RENPHO_EMAIL")?,
            password: required_env("RENPHO_PASSWORD")?,
        };
        let garmin = GarminCredentials {
            email: required_env("GARMIN_EMAIL")?,
            password: required_env("GARMIN_PASSWORD")?,
        };

        let sync_time_raw =
            env::var("SYNC_TIME").unwrap_or_else(|_| DEFAULT_SYNC_TIME.to_owned());
        let sync_time = parse_sync_time(&sync_time_raw)?;

        let tz_raw = env::var("SYNC_TIMEZONE").unwrap_or_else(|_| DEFAULT_TIMEZONE.to_owned());
        let timezone: Tz = tz_raw
            .parse()
            .map_err(|_| SyncError::Config(format!("unknown timezone identifier '{tz_raw}'")))?;

        let defaults = HttpConfig::default();
        let http = HttpConfig {
            timeout_secs: env_u64("HTTP_TIMEOUT_SECS", defaults.timeout_secs)?,
            connect_timeout_secs: env_u64(
                "HTTP_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            )?,
        };

        Ok(Self {
            renpho,
            garmin,
            sync_time,
            timezone,
            http,
        })
    }

    /// One-line startup summary with credentials redacted
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "renpho account {}, garmin account {}, daily sync at {} {}",
            redact_email(&self.renpho.email),
            redact_email(&self.garmin.email),
            self.sync_time.format("%H:%M"),
            self.timezone
        )
    }
}

/// Parse a `HH:MM` 24-hour wall-clock time
fn parse_sync_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map_err(|_| SyncError::Config(format!("SYNC_TIME must be HH:MM (24-hour), got '{raw}'")))
}

fn required_env(key: &str) -> Result<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SyncError::Config(format!(
            "required environment variable {key} is not set"
        ))),
    }
}

fn env_u64(key: &str, default: u64) -> Result<u64> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| SyncError::Config(format!("{key} must be an integer, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}

/// Keep the first character of the local part so operators can tell accounts apart
fn redact_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let head = local.chars().next().unwrap_or('?');
            format!("{head}***@{domain}")
        }
        None => "***".to_owned(),
    }
}
