// ABOUTME: Unified error taxonomy for sync cycles across crypto, transport, auth, and parsing
// ABOUTME: Classifies failures into retryable and fatal-for-the-cycle categories
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Error taxonomy shared by every component of a sync cycle.
//!
//! Only transport-level failures are retryable within a cycle; everything else
//! surfaces immediately and is re-attempted on the next scheduled trigger. All
//! variants are reduced to a cycle outcome at the reconciliation engine
//! boundary so no error ever crashes the long-running process.

use crate::crypto::CryptoError;
use thiserror::Error;

/// Errors raised while fetching, reconciling, or uploading a measurement
#[derive(Debug, Error)]
pub enum SyncError {
    /// Malformed envelope or key material; fatal for the request, never retried
    #[error("crypto envelope error: {0}")]
    Crypto(#[from] CryptoError),

    /// Network-level failure or timeout; retryable with bounded backoff
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Credential or token rejection; fatal for the cycle, no tight-loop retry
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// Decrypted payload did not conform to the expected structure
    #[error("unexpected payload shape: {0}")]
    Parse(String),

    /// Opaque failure reported by the target uploader
    #[error("upload failed: {0}")]
    Upload(String),

    /// Missing or invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Whether the caller may retry this failure with bounded backoff
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SyncError>;
