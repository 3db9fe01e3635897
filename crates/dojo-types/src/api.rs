use serde::{Deserialize, Serialize};

use crate::models::{
    Actor, Message, MessageStatus, Notification, Participant, Priority, Recipient, Role, Thread,
};

// -- JWT Claims --

/// JWT claims issued by the academy identity service. This backend only
/// verifies tokens; it never mints them. Canonical definition lives here so
/// the middleware and handlers share one type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub branch_id: Option<String>,
    pub exp: usize,
}

impl Claims {
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.sub.clone(),
            role: self.role,
            name: self.name.clone(),
            email: self.email.clone(),
            branch_id: self.branch_id.clone(),
        }
    }
}

// -- Messages --

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub recipient_id: String,
    pub recipient_type: Role,
    pub subject: String,
    pub content: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub reply_to_message_id: Option<String>,
    /// Explicit thread targeting; short-circuits thread resolution.
    #[serde(default)]
    pub thread_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendReceipt {
    pub message_id: String,
    pub thread_id: String,
}

/// Patch for message lifecycle flags. Unknown JSON fields are deliberately
/// ignored rather than rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePatch {
    #[serde(default)]
    pub is_read: Option<bool>,
    #[serde(default)]
    pub is_archived: Option<bool>,
    #[serde(default)]
    pub is_deleted: Option<bool>,
    #[serde(default)]
    pub status: Option<MessageStatus>,
}

// -- Conversations --

#[derive(Debug, Serialize)]
pub struct ConversationSummary {
    pub thread_id: String,
    pub subject: String,
    pub participants: Vec<Participant>,
    pub message_count: i64,
    pub last_message: Option<Message>,
    pub last_message_at: Option<chrono::DateTime<chrono::Utc>>,
    pub unread_count: i64,
    pub is_archived: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct ConversationsResponse {
    pub conversations: Vec<ConversationSummary>,
    pub total_count: i64,
    pub skip: i64,
    pub limit: i64,
}

#[derive(Debug, Serialize)]
pub struct ThreadMessagesResponse {
    pub messages: Vec<Message>,
    pub thread: Thread,
    pub total_count: i64,
    pub skip: i64,
    pub limit: i64,
}

// -- Stats --

#[derive(Debug, Serialize)]
pub struct MessageStats {
    pub total_messages: i64,
    pub unread_messages: i64,
    pub sent_messages: i64,
    pub received_messages: i64,
    pub archived_messages: i64,
    pub deleted_messages: i64,
    pub active_conversations: i64,
}

// -- Recipients --

#[derive(Debug, Serialize)]
pub struct RecipientsResponse {
    pub recipients: Vec<Recipient>,
    pub total_count: i64,
}

// -- Notifications --

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
    pub total: i64,
    pub unread_count: i64,
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub message: &'static str,
}
