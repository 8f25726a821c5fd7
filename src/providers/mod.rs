// ABOUTME: Provider integrations for the source (Renpho Health) and target (Garmin Connect)
// ABOUTME: Declares the collaborator traits plus the concrete client implementations
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Provider integrations.
//!
//! The reconciliation engine only depends on the [`core`] traits; the concrete
//! Renpho and Garmin clients live behind them so tests substitute fakes.

/// Collaborator traits consumed by the reconciliation engine
pub mod core;
/// Garmin Connect body-composition uploader
pub mod garmin;
/// Renpho Health encrypted client: session manager and measurement fetcher
pub mod renpho;
/// Retry policy shared by provider callers
pub mod utils;

pub use core::{MeasurementSource, MeasurementUploader};
pub use garmin::{GarminConfig, GarminUploader};
pub use renpho::{RenphoClient, RenphoConfig, Session};
pub use utils::RetryConfig;
