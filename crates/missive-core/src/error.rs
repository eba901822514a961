// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Missive messaging backend.
//!
//! Conditional-update outcomes (`NotFound`, `Deleted`, `VersionConflict`,
//! `NotModified`) are not errors; see [`crate::types::MutationOutcome`].

use thiserror::Error;

/// The primary error type used across all Missive adapter traits and core operations.
#[derive(Debug, Error)]
pub enum MissiveError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, constraint violation).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The version generator cannot produce a value greater than the last one issued.
    #[error("version sequence exhausted at {last}")]
    SequenceExhausted { last: i64 },

    /// The request violates an input constraint checked before reaching storage.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The caller is a participant but not in the role the operation requires.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The presented credential did not resolve to a user.
    #[error("unauthenticated")]
    Unauthenticated,

    /// File-usage notification failed.
    #[error("file usage notifier error: {message}")]
    Notifier {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// HTTP gateway errors (bind failure, server crash).
    #[error("gateway error: {message}")]
    Gateway {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MissiveError {
    /// Whether this error stems from unavailable infrastructure rather than from the request.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::SequenceExhausted { .. } | Self::Internal(_)
        )
    }
}
