// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request validation and participant role checks in front of the store.
//!
//! Everything the HTTP layer needs beyond transport concerns lives here:
//! input normalization, "who may do what", sync paging limits and the
//! best-effort file-usage notifications that follow a create or delete.

use std::collections::HashSet;
use std::sync::Arc;

use missive_core::{
    ChangeLogEntry, Created, FileUsageNotifier, HealthStatus, Message, MessageId, MessageStore,
    MissiveError, MutationOutcome, NewMessage, UserId, Version,
};
use tracing::{debug, warn};

/// Limits applied to incoming requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceLimits {
    /// Page size used when a sync request does not name one.
    pub default_sync_limit: u32,
    /// Largest page size a sync request may ask for.
    pub max_sync_limit: u32,
    /// Exact length every attached file id must have.
    pub file_id_length: usize,
}

impl Default for ServiceLimits {
    fn default() -> Self {
        Self {
            default_sync_limit: 50,
            max_sync_limit: 100,
            file_id_length: 24,
        }
    }
}

/// The messaging operations exposed to authenticated users.
#[derive(Clone)]
pub struct MessagingService {
    store: Arc<dyn MessageStore>,
    notifier: Arc<dyn FileUsageNotifier>,
    limits: ServiceLimits,
}

impl MessagingService {
    pub fn new(
        store: Arc<dyn MessageStore>,
        notifier: Arc<dyn FileUsageNotifier>,
        limits: ServiceLimits,
    ) -> Self {
        Self {
            store,
            notifier,
            limits,
        }
    }

    pub fn limits(&self) -> ServiceLimits {
        self.limits
    }

    /// Validate and store a new message from `sender`.
    ///
    /// Receiver and text are trimmed; empty text counts as absent. All
    /// validation failures are reported together in one `InvalidRequest`.
    pub async fn send(&self, sender: &UserId, draft: NewMessage) -> Result<Created, MissiveError> {
        let message = self.normalize(draft)?;
        let created = self.store.create_message(sender, &message).await?;
        debug!(
            message_id = %created.id,
            version = %created.version,
            user_id = %sender,
            files = message.files.len(),
            "message sent"
        );
        self.notify_usage(message.files, true);
        Ok(created)
    }

    fn normalize(&self, draft: NewMessage) -> Result<NewMessage, MissiveError> {
        let receiver = UserId(draft.receiver.0.trim().to_string());
        let text = trimmed(draft.text);
        let mut problems = Vec::new();

        if receiver.0.is_empty() {
            problems.push("message recipient must be specified".to_string());
        }
        if text.is_none() && draft.files.is_empty() {
            problems.push("message text or attached files must be specified".to_string());
        }
        if draft.files.iter().any(|f| !self.valid_file_id(f)) {
            problems.push(format!(
                "attached file id must be {} bytes long",
                self.limits.file_id_length
            ));
        }
        let mut seen = HashSet::new();
        if !draft.files.iter().all(|f| seen.insert(f.as_str())) {
            problems.push("attached file ids must be unique".to_string());
        }

        if !problems.is_empty() {
            return Err(MissiveError::InvalidRequest(problems.join("\n")));
        }
        Ok(NewMessage {
            receiver,
            text,
            files: draft.files,
        })
    }

    /// File ids are opaque; only their byte length is checked.
    fn valid_file_id(&self, file_id: &str) -> bool {
        file_id.len() == self.limits.file_id_length
    }

    /// The message if `user` takes part in it.
    pub async fn get(&self, user: &UserId, id: MessageId) -> Result<Option<Message>, MissiveError> {
        self.store.get_message(user, id).await
    }

    /// Replace the text of a message `user` sent.
    pub async fn edit_text(
        &self,
        user: &UserId,
        id: MessageId,
        expected: Version,
        text: Option<String>,
    ) -> Result<MutationOutcome, MissiveError> {
        let message = match self.visible(user, id).await? {
            Ok(message) => message,
            Err(outcome) => return Ok(outcome),
        };
        if !message.is_sender(user) {
            return Err(MissiveError::Forbidden(
                "only the sender of a message can edit its text".into(),
            ));
        }
        let text = trimmed(text);
        if text.is_none() && message.files.is_empty() {
            return Err(MissiveError::InvalidRequest(
                "text in a message without attachments cannot be empty".into(),
            ));
        }
        self.store.edit_text(id, expected, text).await
    }

    /// Mark a message `user` received as read.
    pub async fn mark_read(
        &self,
        user: &UserId,
        id: MessageId,
        expected: Version,
    ) -> Result<MutationOutcome, MissiveError> {
        let message = match self.visible(user, id).await? {
            Ok(message) => message,
            Err(outcome) => return Ok(outcome),
        };
        if !message.is_receiver(user) {
            return Err(MissiveError::Forbidden(
                "only the receiver of a message can mark it as read".into(),
            ));
        }
        self.store.set_read(id, expected).await
    }

    /// Delete a message `user` takes part in and release its attachments.
    pub async fn delete(
        &self,
        user: &UserId,
        id: MessageId,
        expected: Version,
    ) -> Result<MutationOutcome, MissiveError> {
        let Some(message) = self.store.get_message(user, id).await? else {
            return Ok(MutationOutcome::NotFound);
        };
        let outcome = self.store.delete_message(id, expected).await?;
        if outcome.applied().is_some() {
            self.notify_usage(message.files, false);
        }
        Ok(outcome)
    }

    /// Change-log entries for `user` after `after`.
    ///
    /// `limit` defaults to the configured page size and must lie in
    /// `1..=max_sync_limit`.
    pub async fn sync(
        &self,
        user: &UserId,
        after: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<ChangeLogEntry>, MissiveError> {
        let max = self.limits.max_sync_limit;
        let limit = match limit {
            None => self.limits.default_sync_limit,
            Some(l) => u32::try_from(l)
                .ok()
                .filter(|l| (1..=max).contains(l))
                .ok_or_else(|| {
                    MissiveError::InvalidRequest(format!(
                        "invalid parameter 'limit': min 1, max {max}"
                    ))
                })?,
        };
        let after = Version(after.unwrap_or(0));
        self.store.sync_updates(user, after, limit).await
    }

    /// Health of the underlying store.
    pub async fn health(&self) -> Result<HealthStatus, MissiveError> {
        self.store.health_check().await
    }

    /// Load a message for a role-checked mutation. A missing message maps to
    /// `NotFound` and a deleted one to `Deleted`, since neither has roles left
    /// to check.
    async fn visible(
        &self,
        user: &UserId,
        id: MessageId,
    ) -> Result<Result<Message, MutationOutcome>, MissiveError> {
        Ok(match self.store.get_message(user, id).await? {
            None => Err(MutationOutcome::NotFound),
            Some(message) if message.deleted => Err(MutationOutcome::Deleted),
            Some(message) => Ok(message),
        })
    }

    fn notify_usage(&self, files: Vec<String>, in_use: bool) {
        if files.is_empty() {
            return;
        }
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            for file_id in files {
                if let Err(e) = notifier.notify(&file_id, in_use).await {
                    warn!(file_id = %file_id, in_use, error = %e, "failed to send file usage");
                }
            }
        });
    }
}

fn trimmed(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}
