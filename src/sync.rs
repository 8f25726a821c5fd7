// ABOUTME: Daily sync reconciliation engine deciding upload versus skip per cycle
// ABOUTME: Owns the process-lifetime SyncState and the transport retry loop around the fetch
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Sync reconciliation engine.
//!
//! `run_cycle` is the single entry point the scheduler invokes. It fetches the
//! daily measurement, decides whether it is new and dated today, and uploads
//! at most once per calendar day within the process lifetime. Every failure is
//! reduced to a [`SyncOutcome::Failed`] result here so nothing escapes to
//! crash the long-running process.
//!
//! State is process-lifetime only: a restart on the same calendar day after a
//! successful upload may re-upload once. That bounded risk is accepted rather
//! than persisting state or querying the target's history.

use crate::errors::Result;
use crate::models::Measurement;
use crate::providers::core::{MeasurementSource, MeasurementUploader};
use crate::providers::utils::RetryConfig;
use chrono::NaiveDate;
use tracing::{error, info, warn};

/// Outcome of one fetch-and-possibly-upload cycle
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// A fresh measurement dated today was uploaded
    Uploaded(Measurement),
    /// The source has no usable record yet
    SkippedNoData,
    /// The source record is not dated today; this tool never backfills
    SkippedStale,
    /// An upload for today already succeeded this process lifetime
    SkippedDuplicate,
    /// The cycle failed; state unchanged so the next trigger retries
    Failed(String),
}

impl SyncOutcome {
    /// Short label for per-cycle summary logs
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Uploaded(_) => "uploaded",
            Self::SkippedNoData => "skipped: no data",
            Self::SkippedStale => "skipped: stale record",
            Self::SkippedDuplicate => "skipped: already uploaded today",
            Self::Failed(_) => "failed",
        }
    }
}

/// Process-local memory of the last successful upload
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncState {
    /// Date of the most recently uploaded measurement, if any
    pub last_uploaded_date: Option<NaiveDate>,
}

/// Reconciliation engine owning its collaborators and the sync state
pub struct SyncEngine<S, U> {
    source: S,
    uploader: U,
    retry: RetryConfig,
    state: SyncState,
}

impl<S, U> SyncEngine<S, U>
where
    S: MeasurementSource,
    U: MeasurementUploader,
{
    /// Create an engine with the default retry policy and empty state
    pub fn new(source: S, uploader: U) -> Self {
        Self {
            source,
            uploader,
            retry: RetryConfig::default(),
            state: SyncState::default(),
        }
    }

    /// Replace the transport retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Date of the last confirmed upload this process lifetime
    #[must_use]
    pub const fn last_uploaded_date(&self) -> Option<NaiveDate> {
        self.state.last_uploaded_date
    }

    /// Run one fetch-and-possibly-upload cycle for the given local date.
    ///
    /// State is updated only after a confirmed-successful upload; a cycle
    /// aborted at any earlier point leaves it untouched.
    pub async fn run_cycle(&mut self, today: NaiveDate) -> SyncOutcome {
        let fetched = match self.fetch_with_retry().await {
            Ok(fetched) => fetched,
            Err(e) => {
                error!(error = %e, "measurement fetch failed");
                return SyncOutcome::Failed(e.to_string());
            }
        };

        let Some(measurement) = fetched else {
            info!("no measurement available upstream yet");
            return SyncOutcome::SkippedNoData;
        };

        if measurement.date != today {
            info!(
                record_date = %measurement.date,
                %today,
                "upstream record is not for today"
            );
            return SyncOutcome::SkippedStale;
        }

        if self.state.last_uploaded_date == Some(today) {
            info!(%today, "upload for today already recorded");
            return SyncOutcome::SkippedDuplicate;
        }

        match self.uploader.upload(&measurement).await {
            Ok(()) => {
                self.state.last_uploaded_date = Some(today);
                info!(%today, weight_kg = ?measurement.weight_kg, "measurement uploaded");
                SyncOutcome::Uploaded(measurement)
            }
            Err(e) => {
                error!(error = %e, "upload failed, will retry next cycle");
                SyncOutcome::Failed(e.to_string())
            }
        }
    }

    /// Fetch with a bounded jittered-backoff loop around transport failures.
    /// Auth, parse, and crypto failures surface on the first occurrence.
    async fn fetch_with_retry(&mut self) -> Result<Option<Measurement>> {
        let mut attempt: u32 = 1;
        loop {
            match self.source.fetch_today().await {
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.backoff_delay(attempt);
                    warn!(
                        error = %e,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "transport failure, backing off before retry"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
