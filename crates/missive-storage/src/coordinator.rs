// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mutation coordinator: every write to a message goes through here.
//!
//! A conditional update takes the per-message lock, then runs one
//! `BEGIN IMMEDIATE` transaction that reads the current row, evaluates its
//! preconditions, draws a version, writes the row, appends the change-log
//! entries and records the version in `timeline`. Anything that fails inside
//! the transaction rolls all of it back.

use std::sync::Arc;

use missive_core::{
    Created, MessageId, MissiveError, MutationOutcome, NewMessage, Transition, UserId, Version,
    VersionGenerator,
};
use rusqlite::TransactionBehavior;
use tracing::{debug, info};

use crate::database::{map_tr_err, Database};
use crate::locks::KeyedLocks;
use crate::queries::change_log;
use crate::queries::messages::{self, MessageState};
use crate::sequence;

/// Current UTC time in the format stored in `created`, `edited` and `read_at`.
pub(crate) fn now_iso() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// The three facts a conditional update is decided on.
///
/// All of them are computed, even when an earlier one already decides the
/// outcome, so the decision is a pure function of this struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Preconditions {
    pub already_deleted: bool,
    pub version_matches: bool,
    pub would_change_state: bool,
}

impl Preconditions {
    pub(crate) fn evaluate(state: &MessageState, expected: Version, transition: &Transition) -> Self {
        let would_change_state = match transition {
            Transition::EditText { text } => {
                normalize_text(text.as_deref()) != state.text.as_deref()
            }
            Transition::MarkRead => state.read_at.is_none(),
            Transition::Delete => !state.deleted,
        };
        Self {
            already_deleted: state.deleted,
            version_matches: state.version == expected,
            would_change_state,
        }
    }

    /// The outcome that stops the update, or `None` if it should be applied.
    pub(crate) fn rejection(self) -> Option<MutationOutcome> {
        if self.already_deleted {
            Some(MutationOutcome::Deleted)
        } else if !self.version_matches {
            Some(MutationOutcome::VersionConflict)
        } else if !self.would_change_state {
            Some(MutationOutcome::NotModified)
        } else {
            None
        }
    }
}

/// Empty text is stored as absent.
fn normalize_text(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.is_empty())
}

/// Serializes message mutations and commits each one atomically.
#[derive(Clone)]
pub struct MutationCoordinator {
    db: Database,
    versions: Arc<dyn VersionGenerator>,
    locks: KeyedLocks,
}

impl MutationCoordinator {
    pub fn new(db: Database, versions: Arc<dyn VersionGenerator>) -> Self {
        Self {
            db,
            versions,
            locks: KeyedLocks::new(),
        }
    }

    /// Insert a message, its attachments and the change-log entries for both
    /// participants in one transaction.
    pub async fn create(
        &self,
        sender: &UserId,
        message: &NewMessage,
    ) -> Result<Created, MissiveError> {
        let versions = Arc::clone(&self.versions);
        let sender = sender.clone();
        let message = message.clone();

        let created = self
            .db
            .connection()
            .call(move |conn| -> rusqlite::Result<Result<Created, MissiveError>> {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let version = match versions.next() {
                    Ok(v) => v,
                    Err(e) => return Ok(Err(e)),
                };
                let now = now_iso();

                let id = messages::insert_message(&tx, &sender, &message, version, &now)?;
                for file_id in &message.files {
                    messages::insert_attachment(&tx, id, file_id)?;
                }
                change_log::append(&tx, &[&sender, &message.receiver], version, id)?;
                sequence::persist(&tx, version)?;
                tx.commit()?;

                Ok(Ok(Created { id, version }))
            })
            .await
            .map_err(map_tr_err)??;

        debug!(id = %created.id, version = %created.version, "message created");
        Ok(created)
    }

    /// Apply `transition` to message `id` if it is still at `expected`.
    ///
    /// Outcome precedence is fixed: not found, deleted, version conflict,
    /// not modified, applied.
    pub async fn conditional_update(
        &self,
        id: MessageId,
        expected: Version,
        transition: Transition,
    ) -> Result<MutationOutcome, MissiveError> {
        let _guard = self.locks.lock(id).await;
        let versions = Arc::clone(&self.versions);
        let kind = transition.kind();

        let outcome = self
            .db
            .connection()
            .call(move |conn| -> rusqlite::Result<Result<MutationOutcome, MissiveError>> {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let Some(state) = messages::select_state(&tx, id)? else {
                    return Ok(Ok(MutationOutcome::NotFound));
                };

                let preconditions = Preconditions::evaluate(&state, expected, &transition);
                if let Some(rejected) = preconditions.rejection() {
                    return Ok(Ok(rejected));
                }

                let version = match versions.next() {
                    Ok(v) => v,
                    Err(e) => return Ok(Err(e)),
                };
                let now = now_iso();

                messages::apply_transition(&tx, id, &transition, version, &now)?;
                change_log::append(&tx, &[&state.sender, &state.receiver], version, id)?;
                sequence::persist(&tx, version)?;
                tx.commit()?;

                Ok(Ok(MutationOutcome::Applied(version)))
            })
            .await
            .map_err(map_tr_err)??;

        match outcome {
            MutationOutcome::Applied(version) => {
                info!(%id, %version, kind, "message updated");
            }
            other => debug!(%id, %expected, kind, outcome = ?other, "update rejected"),
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::queries::change_log::entries_after;
    use crate::queries::messages::get_message;
    use crate::sequence::TimelineSequence;
    use tempfile::tempdir;

    async fn setup() -> (MutationCoordinator, Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("coord.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let coord = MutationCoordinator::new(db.clone(), Arc::new(TimelineSequence::default()));
        (coord, db, dir)
    }

    fn hi(receiver: &str) -> NewMessage {
        NewMessage {
            receiver: UserId::from(receiver),
            text: Some("Hi".into()),
            files: Vec::new(),
        }
    }

    fn edit(text: &str) -> Transition {
        Transition::EditText {
            text: Some(text.into()),
        }
    }

    fn state(version: i64, text: Option<&str>, read: bool, deleted: bool) -> MessageState {
        MessageState {
            version: Version(version),
            sender: UserId::from("a"),
            receiver: UserId::from("b"),
            text: text.map(str::to_string),
            read_at: read.then(|| "t".to_string()),
            deleted,
        }
    }

    /// Generator that fails on demand.
    struct Switchable {
        inner: TimelineSequence,
        fail: AtomicBool,
    }

    impl VersionGenerator for Switchable {
        fn next(&self) -> Result<Version, MissiveError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(MissiveError::Internal("generator offline".into()));
            }
            self.inner.next()
        }
    }

    #[test]
    fn preconditions_are_all_computed() {
        let p = Preconditions::evaluate(&state(3, Some("x"), false, true), Version(1), &edit("x"));
        assert_eq!(
            p,
            Preconditions {
                already_deleted: true,
                version_matches: false,
                would_change_state: false,
            }
        );
        assert_eq!(p.rejection(), Some(MutationOutcome::Deleted));
    }

    #[test]
    fn rejection_follows_precedence() {
        let s = state(2, Some("Hi"), false, false);
        assert_eq!(
            Preconditions::evaluate(&s, Version(1), &edit("Hi")).rejection(),
            Some(MutationOutcome::VersionConflict)
        );
        assert_eq!(
            Preconditions::evaluate(&s, Version(2), &edit("Hi")).rejection(),
            Some(MutationOutcome::NotModified)
        );
        assert_eq!(
            Preconditions::evaluate(&s, Version(2), &edit("Hi!")).rejection(),
            None
        );
    }

    #[test]
    fn would_change_state_per_transition() {
        let unread = state(1, None, false, false);
        let read = state(1, None, true, false);
        assert!(Preconditions::evaluate(&unread, Version(1), &Transition::MarkRead).would_change_state);
        assert!(!Preconditions::evaluate(&read, Version(1), &Transition::MarkRead).would_change_state);
        assert!(Preconditions::evaluate(&read, Version(1), &Transition::Delete).would_change_state);

        let cleared = Transition::EditText { text: Some(String::new()) };
        assert!(
            !Preconditions::evaluate(&unread, Version(1), &cleared).would_change_state,
            "empty text equals absent text"
        );
    }

    #[tokio::test]
    async fn edit_delete_scenario() {
        let (coord, db, _dir) = setup().await;
        let a = UserId::from("a");

        let Created { id, version: v1 } = coord.create(&a, &hi("b")).await.unwrap();

        let v2 = coord
            .conditional_update(id, v1, edit("Hi!"))
            .await
            .unwrap()
            .applied()
            .expect("first edit applies");
        assert!(v2 > v1);

        assert_eq!(
            coord.conditional_update(id, v1, edit("Hi!")).await.unwrap(),
            MutationOutcome::VersionConflict
        );
        assert_eq!(
            coord.conditional_update(id, v2, edit("Hi!")).await.unwrap(),
            MutationOutcome::NotModified
        );

        let v3 = coord
            .conditional_update(id, v2, Transition::Delete)
            .await
            .unwrap()
            .applied()
            .expect("delete applies");
        assert!(v3 > v2);

        assert_eq!(
            coord.conditional_update(id, v3, edit("x")).await.unwrap(),
            MutationOutcome::Deleted
        );

        for user in ["a", "b"] {
            let stamps: Vec<Version> = entries_after(&db, &UserId::from(user), Version::ZERO, 50)
                .await
                .unwrap()
                .into_iter()
                .map(|e| e.timestamp)
                .collect();
            assert_eq!(stamps, [v1, v2, v3]);
        }

        let msg = get_message(&db, &a, id).await.unwrap().unwrap();
        assert!(msg.deleted);
        assert_eq!(msg.version, v3);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn missing_message_is_not_found() {
        let (coord, db, _dir) = setup().await;
        assert_eq!(
            coord
                .conditional_update(MessageId(42), Version(1), Transition::MarkRead)
                .await
                .unwrap(),
            MutationOutcome::NotFound
        );
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mark_read_sets_timestamp_once() {
        let (coord, db, _dir) = setup().await;
        let created = coord.create(&UserId::from("a"), &hi("b")).await.unwrap();

        let v2 = coord
            .conditional_update(created.id, created.version, Transition::MarkRead)
            .await
            .unwrap()
            .applied()
            .unwrap();
        assert_eq!(
            coord
                .conditional_update(created.id, v2, Transition::MarkRead)
                .await
                .unwrap(),
            MutationOutcome::NotModified
        );

        let msg = get_message(&db, &UserId::from("b"), created.id)
            .await
            .unwrap()
            .unwrap();
        assert!(msg.read_at.is_some());
        assert!(msg.edited.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_updates_from_one_version_apply_once() {
        let (coord, db, _dir) = setup().await;
        let created = coord.create(&UserId::from("a"), &hi("b")).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let coord = coord.clone();
                tokio::spawn(async move {
                    coord
                        .conditional_update(created.id, created.version, edit(&format!("v{i}")))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut applied = 0;
        for handle in handles {
            match handle.await.unwrap() {
                MutationOutcome::Applied(_) => applied += 1,
                MutationOutcome::VersionConflict => {}
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert_eq!(applied, 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn generator_failure_leaves_no_trace() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("fail.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let generator = Arc::new(Switchable {
            inner: TimelineSequence::default(),
            fail: AtomicBool::new(false),
        });
        let coord = MutationCoordinator::new(db.clone(), generator.clone());
        let a = UserId::from("a");

        let created = coord.create(&a, &hi("b")).await.unwrap();
        generator.fail.store(true, Ordering::SeqCst);

        let err = coord
            .conditional_update(created.id, created.version, edit("changed"))
            .await
            .unwrap_err();
        assert!(err.is_infrastructure());
        assert!(coord.create(&a, &hi("b")).await.is_err());

        let msg = get_message(&db, &a, created.id).await.unwrap().unwrap();
        assert_eq!(msg.version, created.version);
        assert_eq!(msg.text.as_deref(), Some("Hi"));
        assert_eq!(
            entries_after(&db, &a, Version::ZERO, 50).await.unwrap().len(),
            1
        );

        generator.fail.store(false, Ordering::SeqCst);
        let applied = coord
            .conditional_update(created.id, created.version, edit("changed"))
            .await
            .unwrap();
        assert!(applied.applied().is_some());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn failed_attachment_insert_rolls_back_create() {
        let (coord, db, _dir) = setup().await;
        let a = UserId::from("a");
        let dup = NewMessage {
            receiver: UserId::from("b"),
            text: None,
            files: vec!["f1".into(), "f1".into()],
        };

        assert!(coord.create(&a, &dup).await.is_err());

        let counts: (i64, i64, i64) = db
            .connection()
            .call(|conn| -> rusqlite::Result<(i64, i64, i64)> {
                let count = |table: &str| {
                    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
                };
                Ok((count("messages")?, count("attachments")?, count("updates")?))
            })
            .await
            .unwrap();
        assert_eq!(counts, (0, 0, 0));
        db.close().await.unwrap();
    }
}
