// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message store trait: repository, change log and mutation coordinator behind one seam.

use async_trait::async_trait;

use crate::error::MissiveError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    ChangeLogEntry, Created, Message, MessageId, MutationOutcome, NewMessage, Transition, UserId,
    Version,
};

/// Persistence backend for direct messages.
///
/// `create_message` and `conditional_update` are each one all-or-nothing
/// unit: the message row, its attachments or transition, the version draw and
/// the change-log entries commit together or not at all. Reads never block on
/// the per-message lock.
#[async_trait]
pub trait MessageStore: PluginAdapter {
    /// Initializes the backend (migrations, sequence recovery).
    async fn initialize(&self) -> Result<(), MissiveError>;

    /// Closes the backend, flushing pending writes.
    async fn close(&self) -> Result<(), MissiveError>;

    /// Inserts a message with its attachments and returns its id and first version.
    async fn create_message(
        &self,
        sender: &UserId,
        message: &NewMessage,
    ) -> Result<Created, MissiveError>;

    /// Returns the message if `user` is its sender or receiver.
    async fn get_message(
        &self,
        user: &UserId,
        id: MessageId,
    ) -> Result<Option<Message>, MissiveError>;

    /// Applies `transition` if the message exists, is not deleted, is at
    /// `expected` and would actually change.
    async fn conditional_update(
        &self,
        id: MessageId,
        expected: Version,
        transition: Transition,
    ) -> Result<MutationOutcome, MissiveError>;

    /// Change-log entries for `user` strictly after `after`, ascending, at most `limit`.
    async fn sync_updates(
        &self,
        user: &UserId,
        after: Version,
        limit: u32,
    ) -> Result<Vec<ChangeLogEntry>, MissiveError>;

    async fn edit_text(
        &self,
        id: MessageId,
        expected: Version,
        text: Option<String>,
    ) -> Result<MutationOutcome, MissiveError> {
        self.conditional_update(id, expected, Transition::EditText { text })
            .await
    }

    async fn set_read(
        &self,
        id: MessageId,
        expected: Version,
    ) -> Result<MutationOutcome, MissiveError> {
        self.conditional_update(id, expected, Transition::MarkRead)
            .await
    }

    async fn delete_message(
        &self,
        id: MessageId,
        expected: Version,
    ) -> Result<MutationOutcome, MissiveError> {
        self.conditional_update(id, expected, Transition::Delete)
            .await
    }
}
