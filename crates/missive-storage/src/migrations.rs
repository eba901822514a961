// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and applied on
//! every [`crate::Database::open`].

use missive_core::MissiveError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
///
/// Refinery tracks applied migrations in its own `refinery_schema_history` table.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), MissiveError> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(|e| MissiveError::Storage {
            source: Box::new(e),
        })?;
    Ok(())
}
