// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the store, the coordinator and the gateway.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of a message. Assigned by storage at creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a user as resolved by an [`crate::Authenticator`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A stamp drawn from the global version sequence.
///
/// Every mutation of every message draws a fresh one, so versions double as
/// optimistic-concurrency tokens and as positions in the global change order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(pub i64);

impl Version {
    /// The version that precedes every issued one. Syncing after it returns the full log.
    pub const ZERO: Version = Version(0);
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A direct message as seen by one of its participants.
///
/// For a deleted message only `id`, `version` and `deleted` carry information;
/// every other field is unset and `files` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub version: Version,
    pub sender: Option<UserId>,
    pub receiver: Option<UserId>,
    /// ISO 8601 creation time.
    pub created: Option<String>,
    /// ISO 8601 time of the last text edit.
    pub edited: Option<String>,
    /// ISO 8601 time the receiver marked the message read.
    pub read_at: Option<String>,
    pub text: Option<String>,
    pub files: Vec<String>,
    pub deleted: bool,
}

impl Message {
    /// Returns true if `user` sent this message.
    pub fn is_sender(&self, user: &UserId) -> bool {
        self.sender.as_ref() == Some(user)
    }

    /// Returns true if `user` received this message.
    pub fn is_receiver(&self, user: &UserId) -> bool {
        self.receiver.as_ref() == Some(user)
    }
}

/// Input for creating a message. Validated before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub receiver: UserId,
    pub text: Option<String>,
    pub files: Vec<String>,
}

/// Result of a successful create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Created {
    pub id: MessageId,
    pub version: Version,
}

/// A state transition applied by a conditional update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Replace the text. `None` clears it (only valid when attachments exist).
    EditText { text: Option<String> },
    /// Mark the message read by its receiver. There is no reverse transition.
    MarkRead,
    /// Soft-delete the message.
    Delete,
}

impl Transition {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EditText { .. } => "edit_text",
            Self::MarkRead => "mark_read",
            Self::Delete => "delete",
        }
    }
}

/// Result of a conditional update, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The message does not exist.
    NotFound,
    /// The message is already deleted; no further mutation is possible.
    Deleted,
    /// The caller's expected version is stale.
    VersionConflict,
    /// The transition would not change the message.
    NotModified,
    /// The transition was applied and stamped with a new version.
    Applied(Version),
}

impl MutationOutcome {
    /// The new version if the transition was applied.
    pub fn applied(self) -> Option<Version> {
        match self {
            Self::Applied(v) => Some(v),
            _ => None,
        }
    }
}

/// One row of a user's change log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub user_id: UserId,
    pub timestamp: Version,
    pub message_id: MessageId,
}

/// A transport credential handed to an [`crate::Authenticator`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub key: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("key", &"[redacted]")
            .field("ip", &self.ip)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    FileUsage,
    Auth,
}
