// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Global version sequence.

use crate::error::MissiveError;
use crate::types::Version;

/// Source of version stamps for every message mutation.
///
/// Each call returns a value strictly greater than every value previously
/// returned by this generator. Gaps are allowed; duplicates are not. Errors
/// are fatal to the calling mutation and are never retried.
pub trait VersionGenerator: Send + Sync + 'static {
    fn next(&self) -> Result<Version, MissiveError>;
}
