//! Messaging Model (buyer/seller conversations)

use serde::{Deserialize, Serialize};

/// Message payload kind
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum MessageType {
    #[default]
    Text,
    Image,
    File,
    Product,
}

/// File or image attached to a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
}

/// Two-party conversation, optionally about one product.
///
/// Participants are stored ordered (`participant_a < participant_b`) so a
/// pair plus product maps to exactly one row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Conversation {
    pub id: i64,
    pub participant_a: i64,
    pub participant_b: i64,
    pub product_id: Option<i64>,
    pub last_message_id: Option<i64>,
    pub unread_a: i64,
    pub unread_b: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Conversation {
    pub fn has_participant(&self, user_id: i64) -> bool {
        self.participant_a == user_id || self.participant_b == user_id
    }

    /// The participant that is not `user_id`
    pub fn other_participant(&self, user_id: i64) -> i64 {
        if self.participant_a == user_id {
            self.participant_b
        } else {
            self.participant_a
        }
    }
}

/// Conversation as seen by one participant (list and get-or-create)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ConversationSummary {
    pub id: i64,
    pub other_user_id: i64,
    pub other_first_name: String,
    pub other_last_name: String,
    pub other_shop_name: Option<String>,
    pub product_id: Option<i64>,
    pub product_title: Option<String>,
    pub last_message: Option<String>,
    pub last_sender_id: Option<i64>,
    pub last_message_at: Option<i64>,
    pub my_unread_count: i64,
    pub updated_at: i64,
}

/// Message entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub message_type: MessageType,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub attachments: Vec<Attachment>,
    pub is_deleted: bool,
    /// Set when the other participant marks the conversation read
    pub read_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Open (or find) a conversation with another user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationOpen {
    pub participant_id: i64,
    pub product_id: Option<i64>,
}

/// Send-message payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCreate {
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Message list paging (query string)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
