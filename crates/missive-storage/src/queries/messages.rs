// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message repository queries.
//!
//! Write helpers take a plain `&Connection` so the coordinator can call them
//! inside its own transaction; reads are async and go through [`Database`].

use missive_core::{Message, MessageId, MissiveError, NewMessage, Transition, UserId, Version};
use rusqlite::{params, Connection, OptionalExtension};

use crate::database::Database;

/// The columns a conditional update needs to decide its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MessageState {
    pub version: Version,
    pub sender: UserId,
    pub receiver: UserId,
    pub text: Option<String>,
    pub read_at: Option<String>,
    pub deleted: bool,
}

/// Insert the message row and return the id SQLite assigned to it.
pub(crate) fn insert_message(
    conn: &Connection,
    sender: &UserId,
    message: &NewMessage,
    version: Version,
    now: &str,
) -> rusqlite::Result<MessageId> {
    conn.query_row(
        "INSERT INTO messages (version, sender, receiver, created, message_text)
         VALUES (?1, ?2, ?3, ?4, NULLIF(?5, ''))
         RETURNING id",
        params![
            version.0,
            sender.0,
            message.receiver.0,
            now,
            message.text,
        ],
        |row| row.get(0).map(MessageId),
    )
}

pub(crate) fn insert_attachment(
    conn: &Connection,
    id: MessageId,
    file_id: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO attachments (message_id, file_id) VALUES (?1, ?2)",
        params![id.0, file_id],
    )?;
    Ok(())
}

/// Read the decision columns of a message. `None` if it does not exist.
pub(crate) fn select_state(
    conn: &Connection,
    id: MessageId,
) -> rusqlite::Result<Option<MessageState>> {
    conn.query_row(
        "SELECT version, sender, receiver, message_text, read_at, is_deleted
         FROM messages WHERE id = ?1",
        params![id.0],
        |row| {
            Ok(MessageState {
                version: Version(row.get(0)?),
                sender: UserId(row.get(1)?),
                receiver: UserId(row.get(2)?),
                text: row.get(3)?,
                read_at: row.get(4)?,
                deleted: row.get(5)?,
            })
        },
    )
    .optional()
}

/// Write `transition` and the new version to the message row.
pub(crate) fn apply_transition(
    conn: &Connection,
    id: MessageId,
    transition: &Transition,
    version: Version,
    now: &str,
) -> rusqlite::Result<()> {
    match transition {
        Transition::EditText { text } => conn.execute(
            "UPDATE messages SET version = ?1, message_text = NULLIF(?2, ''), edited = ?3
             WHERE id = ?4",
            params![version.0, text, now, id.0],
        ),
        Transition::MarkRead => conn.execute(
            "UPDATE messages SET version = ?1, read_at = ?2 WHERE id = ?3",
            params![version.0, now, id.0],
        ),
        Transition::Delete => conn.execute(
            "UPDATE messages SET
                 version = ?1,
                 created = NULL,
                 edited = NULL,
                 read_at = NULL,
                 message_text = NULL,
                 is_deleted = 1
             WHERE id = ?2",
            params![version.0, id.0],
        ),
    }?;
    Ok(())
}

/// Load a message as seen by `user`.
///
/// Returns `None` when the message does not exist or `user` is not one of its
/// participants. Deleted messages come back with every optional field unset
/// and no attachments.
pub async fn get_message(
    db: &Database,
    user: &UserId,
    id: MessageId,
) -> Result<Option<Message>, MissiveError> {
    let user = user.clone();
    db.connection()
        .call(move |conn| select_message(conn, &user, id))
        .await
        .map_err(crate::database::map_tr_err)
}

pub(crate) fn select_message(
    conn: &Connection,
    user: &UserId,
    id: MessageId,
) -> rusqlite::Result<Option<Message>> {
    let found = conn
        .query_row(
            "SELECT version, sender, receiver, created, edited, read_at, message_text, is_deleted
             FROM messages
             WHERE id = ?1 AND (sender = ?2 OR receiver = ?2)",
            params![id.0, user.0],
            |row| {
                Ok(Message {
                    id,
                    version: Version(row.get(0)?),
                    sender: Some(UserId(row.get(1)?)),
                    receiver: Some(UserId(row.get(2)?)),
                    created: row.get(3)?,
                    edited: row.get(4)?,
                    read_at: row.get(5)?,
                    text: row.get(6)?,
                    files: Vec::new(),
                    deleted: row.get(7)?,
                })
            },
        )
        .optional()?;

    let Some(mut message) = found else {
        return Ok(None);
    };

    if message.deleted {
        return Ok(Some(Message {
            sender: None,
            receiver: None,
            created: None,
            edited: None,
            read_at: None,
            text: None,
            ..message
        }));
    }

    message.files = select_attachments(conn, id)?;
    Ok(Some(message))
}

/// File ids attached to a message, in insertion order.
pub(crate) fn select_attachments(conn: &Connection, id: MessageId) -> rusqlite::Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT file_id FROM attachments WHERE message_id = ?1 ORDER BY rowid")?;
    let rows = stmt.query_map(params![id.0], |row| row.get(0))?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn new_message(receiver: &str, text: Option<&str>, files: &[&str]) -> NewMessage {
        NewMessage {
            receiver: UserId::from(receiver),
            text: text.map(str::to_string),
            files: files.iter().map(|f| f.to_string()).collect(),
        }
    }

    async fn insert(db: &Database, sender: &str, message: NewMessage, version: i64) -> MessageId {
        let sender = UserId::from(sender);
        db.connection()
            .call(move |conn| -> Result<MessageId, rusqlite::Error> {
                let id = insert_message(
                    conn,
                    &sender,
                    &message,
                    Version(version),
                    "2026-01-01T00:00:00.000Z",
                )?;
                for file in &message.files {
                    insert_attachment(conn, id, file)?;
                }
                Ok(id)
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn participants_see_message_with_attachments() {
        let (db, _dir) = setup_db().await;
        let id = insert(&db, "a", new_message("b", Some("Hi"), &["f1", "f2"]), 1).await;

        for user in ["a", "b"] {
            let msg = get_message(&db, &UserId::from(user), id)
                .await
                .unwrap()
                .expect("participant should see message");
            assert_eq!(msg.text.as_deref(), Some("Hi"));
            assert_eq!(msg.version, Version(1));
            assert_eq!(msg.sender, Some(UserId::from("a")));
            assert_eq!(msg.receiver, Some(UserId::from("b")));
            assert_eq!(msg.files, ["f1", "f2"]);
            assert!(!msg.deleted);
        }

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn outsiders_and_missing_ids_get_none() {
        let (db, _dir) = setup_db().await;
        let id = insert(&db, "a", new_message("b", Some("Hi"), &[]), 1).await;

        assert!(get_message(&db, &UserId::from("c"), id).await.unwrap().is_none());
        assert!(
            get_message(&db, &UserId::from("a"), MessageId(id.0 + 100))
                .await
                .unwrap()
                .is_none()
        );
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn empty_text_is_stored_as_absent() {
        let (db, _dir) = setup_db().await;
        let id = insert(&db, "a", new_message("b", Some(""), &["f1"]), 1).await;

        let msg = get_message(&db, &UserId::from("b"), id).await.unwrap().unwrap();
        assert_eq!(msg.text, None);
        assert_eq!(msg.files, ["f1"]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn deleted_message_hides_everything_but_identity() {
        let (db, _dir) = setup_db().await;
        let id = insert(&db, "a", new_message("b", Some("secret"), &["f1"]), 1).await;

        db.connection()
            .call(move |conn| {
                apply_transition(conn, id, &Transition::Delete, Version(2), "ignored")
            })
            .await
            .unwrap();

        let msg = get_message(&db, &UserId::from("a"), id).await.unwrap().unwrap();
        assert!(msg.deleted);
        assert_eq!(msg.version, Version(2));
        assert_eq!(msg.id, id);
        assert!(msg.sender.is_none());
        assert!(msg.receiver.is_none());
        assert!(msg.created.is_none());
        assert!(msg.text.is_none());
        assert!(msg.files.is_empty());

        // The attachment row itself stays for usage reconciliation.
        let rows: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM attachments", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(rows, 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn select_state_reports_decision_columns() {
        let (db, _dir) = setup_db().await;
        let id = insert(&db, "a", new_message("b", Some("Hi"), &[]), 4).await;

        let state = db
            .connection()
            .call(move |conn| -> rusqlite::Result<Option<MessageState>> {
                apply_transition(conn, id, &Transition::MarkRead, Version(5), "t-read")?;
                select_state(conn, id)
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(state.version, Version(5));
        assert_eq!(state.sender, UserId::from("a"));
        assert_eq!(state.receiver, UserId::from("b"));
        assert_eq!(state.text.as_deref(), Some("Hi"));
        assert_eq!(state.read_at.as_deref(), Some("t-read"));
        assert!(!state.deleted);
        db.close().await.unwrap();
    }
}
