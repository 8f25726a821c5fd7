// ABOUTME: Collaborator traits at the seams of the reconciliation engine
// ABOUTME: Source fetch and target upload contracts with fake-friendly signatures
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Traits the reconciliation engine depends on.
//!
//! The engine owns its collaborators through these traits rather than concrete
//! clients, which keeps `run_cycle` testable with fakes substituted for the
//! network-facing implementations.

use crate::errors::Result;
use crate::models::Measurement;
use async_trait::async_trait;

/// Source of the daily body-composition record.
#[async_trait]
pub trait MeasurementSource: Send {
    /// Fetch the most recent daily record from the source provider.
    ///
    /// Returns `Ok(None)` when the upstream responds normally but carries no
    /// usable record yet (the user has not weighed in today, or the summary
    /// block is absent). That is an expected outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::SyncError`] for transport, auth, crypto, or
    /// payload-shape failures.
    async fn fetch_today(&mut self) -> Result<Option<Measurement>>;
}

/// Sink that accepts one normalized measurement for upload.
///
/// The engine does not inspect target-provider response shapes beyond
/// success or failure; implementations reduce their own failures to
/// [`crate::errors::SyncError::Upload`].
#[async_trait]
pub trait MeasurementUploader: Send {
    /// Upload a measurement to the target provider.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::SyncError::Upload`] with an opaque reason on
    /// any failure.
    async fn upload(&mut self, measurement: &Measurement) -> Result<()>;
}
