// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The global version sequence ("timeline").
//!
//! [`TimelineSequence`] is an in-process atomic counter. Durability comes from
//! the single-row `timeline` table: every committing unit of work records the
//! version it drew in the same transaction, and the counter resumes from that
//! row (or the highest stored message version, whichever is larger) on open.
//! A committed version is therefore never issued twice, even across restarts.

use std::sync::atomic::{AtomicI64, Ordering};

use missive_core::{MissiveError, Version, VersionGenerator};
use rusqlite::{params, Connection};

/// Atomic version counter resumed from persisted state.
#[derive(Debug, Default)]
pub struct TimelineSequence {
    last: AtomicI64,
}

impl TimelineSequence {
    /// Continue after `last`; the first draw returns `last + 1`.
    pub fn resume_after(last: Version) -> Self {
        Self {
            last: AtomicI64::new(last.0),
        }
    }

    /// The most recently issued version, or the resume point if none was drawn yet.
    pub fn last_issued(&self) -> Version {
        Version(self.last.load(Ordering::SeqCst))
    }
}

impl VersionGenerator for TimelineSequence {
    fn next(&self) -> Result<Version, MissiveError> {
        self.last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_add(1))
            .map(|prev| Version(prev + 1))
            .map_err(|last| MissiveError::SequenceExhausted { last })
    }
}

/// Highest version ever committed.
pub(crate) fn load_last(conn: &Connection) -> rusqlite::Result<Version> {
    conn.query_row(
        "SELECT MAX(
             (SELECT last_value FROM timeline WHERE id = 1),
             COALESCE((SELECT MAX(version) FROM messages), 0)
         )",
        [],
        |row| row.get(0).map(Version),
    )
}

/// Record `version` as drawn. Must run inside the transaction that uses it.
pub(crate) fn persist(conn: &Connection, version: Version) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE timeline SET last_value = ?1 WHERE id = 1 AND last_value < ?1",
        params![version.0],
    )?;
    Ok(())
}
