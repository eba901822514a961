// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Versioned JSON representations used on the wire.

use missive_core::{ChangeLogEntry, Message, NewMessage, UserId};
use serde::{Deserialize, Serialize};

pub const MIME_NEW_PERSONAL_MESSAGE_V1: &str = "application/vnd.newPersonalMessage.v1+json";
pub const MIME_PERSONAL_MESSAGE_V1: &str = "application/vnd.personalMessage.v1+json";
pub const MIME_MESSAGE_UPDATES_V1: &str = "application/vnd.messageUpdates.v1+json";
pub const MIME_EDITED_MESSAGE_TEXT_V1: &str = "application/vnd.editedMessageText.v1+json";
pub const MIME_MESSAGE_READ_MARK_V1: &str = "application/vnd.messageReadMark.v1+json";

/// Schema `newPersonalMessage.v1`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPersonalMessageV1 {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
}

impl From<NewPersonalMessageV1> for NewMessage {
    fn from(body: NewPersonalMessageV1) -> Self {
        NewMessage {
            receiver: UserId(body.to),
            text: body.text,
            files: body.files,
        }
    }
}

/// Schema `personalMessage.v1`. Unset fields are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalMessageV1 {
    pub id: i64,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
}

impl From<Message> for PersonalMessageV1 {
    fn from(m: Message) -> Self {
        Self {
            id: m.id.0,
            timestamp: m.version.0,
            from: m.sender.map(|u| u.0),
            to: m.receiver.map(|u| u.0),
            created: m.created,
            edited: m.edited,
            read: m.read_at,
            text: m.text,
            files: m.files,
            deleted: m.deleted,
        }
    }
}

/// Schema `editedMessageText.v1`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditedMessageTextV1 {
    #[serde(default)]
    pub text: Option<String>,
}

/// Schema `messageReadMark.v1`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageReadMarkV1 {
    pub read: bool,
}

/// Schema `messageUpdates.v1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageUpdatesV1 {
    pub total: usize,
    pub messages: Vec<MessageUpdateV1>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageUpdateV1 {
    pub id: i64,
    pub timestamp: i64,
}

impl From<Vec<ChangeLogEntry>> for MessageUpdatesV1 {
    fn from(entries: Vec<ChangeLogEntry>) -> Self {
        let messages: Vec<_> = entries
            .into_iter()
            .map(|e| MessageUpdateV1 {
                id: e.message_id.0,
                timestamp: e.timestamp.0,
            })
            .collect();
        Self {
            total: messages.len(),
            messages,
        }
    }
}

#[cfg(test)]
mod tests {
    use missive_core::{MessageId, Version};

    use super::*;

    #[test]
    fn deleted_message_serializes_identity_only() {
        let message = Message {
            id: MessageId(3),
            version: Version(9),
            sender: None,
            receiver: None,
            created: None,
            edited: None,
            read_at: None,
            text: None,
            files: Vec::new(),
            deleted: true,
        };
        let json = serde_json::to_value(PersonalMessageV1::from(message)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 3, "timestamp": 9, "deleted": true})
        );
    }

    #[test]
    fn live_message_omits_deleted_flag() {
        let message = Message {
            id: MessageId(1),
            version: Version(2),
            sender: Some(UserId::from("a")),
            receiver: Some(UserId::from("b")),
            created: Some("2026-01-01T00:00:00.000Z".into()),
            edited: None,
            read_at: None,
            text: Some("Hi".into()),
            files: vec!["f".repeat(24)],
            deleted: false,
        };
        let json = serde_json::to_value(PersonalMessageV1::from(message)).unwrap();
        assert_eq!(json["from"], "a");
        assert_eq!(json["to"], "b");
        assert_eq!(json["text"], "Hi");
        assert!(json.get("deleted").is_none());
        assert!(json.get("edited").is_none());
    }

    #[test]
    fn new_message_fields_default_when_missing() {
        let body: NewPersonalMessageV1 = serde_json::from_str(r#"{"to": "b"}"#).unwrap();
        assert_eq!(body.to, "b");
        assert!(body.text.is_none());
        assert!(body.files.is_empty());
    }

    #[test]
    fn null_text_is_absent() {
        let body: NewPersonalMessageV1 =
            serde_json::from_str(r#"{"to":"b","text":null,"files":["aaaaaaaaaaaaaaaaaaaaaaaa"]}"#)
                .unwrap();
        let message = NewMessage::from(body);
        assert_eq!(message.text, None);
        assert_eq!(message.files.len(), 1);

        let edit: EditedMessageTextV1 = serde_json::from_str(r#"{"text": null}"#).unwrap();
        assert!(edit.text.is_none());
    }

    #[test]
    fn updates_report_their_count() {
        let updates = MessageUpdatesV1::from(vec![
            ChangeLogEntry {
                user_id: UserId::from("a"),
                timestamp: Version(4),
                message_id: MessageId(1),
            },
            ChangeLogEntry {
                user_id: UserId::from("a"),
                timestamp: Version(7),
                message_id: MessageId(2),
            },
        ]);
        assert_eq!(updates.total, 2);
        assert_eq!(
            serde_json::to_value(&updates).unwrap()["messages"][1],
            serde_json::json!({"id": 2, "timestamp": 7})
        );
    }

    #[test]
    fn read_mark_requires_flag() {
        assert!(serde_json::from_str::<MessageReadMarkV1>("{}").is_err());
        assert!(serde_json::from_str::<MessageReadMarkV1>(r#"{"read": true}"#).unwrap().read);
    }
}
