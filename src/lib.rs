// ABOUTME: Library root for the Renpho Health to Garmin Connect daily sync service
// ABOUTME: Wires the encrypted source client, reconciliation engine, uploader, and scheduler
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Unattended daily body-composition sync from Renpho Health to Garmin Connect.
//!
//! One sync cycle runs at process start and one per calendar day at the
//! configured local time. A cycle fetches the latest daily record through the
//! encrypted Renpho client, decides whether it is new and dated today, and
//! uploads it at most once per day. The service never double-submits and never
//! submits stale data.

/// Environment-based configuration
pub mod config;
/// AES envelope codec for the Renpho wire format
pub mod crypto;
/// Error taxonomy shared across a sync cycle
pub mod errors;
/// Structured logging setup
pub mod logging;
/// Normalized measurement model
pub mod models;
/// Source and target provider integrations
pub mod providers;
/// Daily trigger loop
pub mod scheduler;
/// Sync reconciliation engine
pub mod sync;

pub use config::AppConfig;
pub use crypto::{CryptoError, EnvelopeCodec};
pub use errors::SyncError;
pub use models::Measurement;
pub use providers::{
    GarminConfig, GarminUploader, MeasurementSource, MeasurementUploader, RenphoClient,
    RenphoConfig, RetryConfig,
};
pub use scheduler::Scheduler;
pub use sync::{SyncEngine, SyncOutcome, SyncState};
