// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user change log ("updates").
//!
//! Each committed mutation appends one row per distinct participant, keyed by
//! `(user_id, event_timestamp)`. Rows are never updated or deleted.

use missive_core::{ChangeLogEntry, MessageId, MissiveError, UserId, Version};
use rusqlite::{params, Connection};

use crate::database::Database;

/// Append an entry at `version` for every distinct user in `participants`.
///
/// A self-addressed message has one participant and gets one row.
pub(crate) fn append(
    conn: &Connection,
    participants: &[&UserId],
    version: Version,
    message_id: MessageId,
) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO updates (user_id, event_timestamp, message_id) VALUES (?1, ?2, ?3)",
    )?;
    for (i, user) in participants.iter().enumerate() {
        if participants[..i].contains(user) {
            continue;
        }
        stmt.execute(params![user.0, version.0, message_id.0])?;
    }
    Ok(())
}

pub(crate) fn select_after(
    conn: &Connection,
    user: &UserId,
    after: Version,
    limit: u32,
) -> rusqlite::Result<Vec<ChangeLogEntry>> {
    let mut stmt = conn.prepare_cached(
        "SELECT event_timestamp, message_id FROM updates
         WHERE user_id = ?1 AND event_timestamp > ?2
         ORDER BY event_timestamp ASC
         LIMIT ?3",
    )?;
    let rows = stmt.query_map(params![user.0, after.0, limit], |row| {
        Ok(ChangeLogEntry {
            user_id: user.clone(),
            timestamp: Version(row.get(0)?),
            message_id: MessageId(row.get(1)?),
        })
    })?;
    rows.collect()
}

/// Entries for `user` with a timestamp strictly greater than `after`,
/// oldest first, at most `limit` of them.
pub async fn entries_after(
    db: &Database,
    user: &UserId,
    after: Version,
    limit: u32,
) -> Result<Vec<ChangeLogEntry>, MissiveError> {
    let user = user.clone();
    db.connection()
        .call(move |conn| select_after(conn, &user, after, limit))
        .await
        .map_err(crate::database::map_tr_err)
}
