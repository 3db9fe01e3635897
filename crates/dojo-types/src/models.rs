use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The four actor types of the academy. The access-control matrix in
/// dojo-messaging is keyed on pairs of this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Coach,
    BranchManager,
    // Older tokens carry the legacy spelling.
    #[serde(alias = "super_admin")]
    Superadmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Coach => "coach",
            Role::BranchManager => "branch_manager",
            Role::Superadmin => "superadmin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Role::Student),
            "coach" => Some(Role::Coach),
            "branch_manager" => Some(Role::BranchManager),
            "superadmin" | "super_admin" => Some(Role::Superadmin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "normal" => Some(Priority::Normal),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

/// Display status derived from the orthogonal message flags. The flags
/// (`is_read`, `is_archived`, `is_deleted`) are the source of truth; this is
/// what clients render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
    Archived,
    Deleted,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Sent => "sent",
            MessageStatus::Delivered => "delivered",
            MessageStatus::Read => "read",
            MessageStatus::Archived => "archived",
            MessageStatus::Deleted => "deleted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sent" => Some(MessageStatus::Sent),
            "delivered" => Some(MessageStatus::Delivered),
            "read" => Some(MessageStatus::Read),
            "archived" => Some(MessageStatus::Archived),
            "deleted" => Some(MessageStatus::Deleted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewMessage,
    MessageReply,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewMessage => "new_message",
            NotificationKind::MessageReply => "message_reply",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new_message" => Some(NotificationKind::NewMessage),
            "message_reply" => Some(NotificationKind::MessageReply),
            _ => None,
        }
    }
}

/// The authenticated principal, built from JWT claims and passed explicitly
/// into every core operation. There is no ambient session.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: String,
    pub role: Role,
    pub name: String,
    pub email: String,
    pub branch_id: Option<String>,
}

impl Actor {
    pub fn is_superadmin(&self) -> bool {
        self.role == Role::Superadmin
    }
}

/// Denormalized identity snapshot embedded in threads and messages so that
/// conversations render without directory lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: String,
    pub user_type: Role,
    pub user_name: String,
    pub user_email: String,
    pub branch_id: Option<String>,
}

/// A contact the actor is allowed to address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub role: Role,
    pub branch_id: Option<String>,
}

/// Persistent grouping of messages between exactly two participants under one
/// logical subject. Never deleted; only muted via message-level flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub subject: String,
    pub participants: Vec<Participant>,
    pub message_count: i64,
    pub last_message_id: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub last_sender_id: Option<String>,
    pub is_active: bool,
    pub is_archived: bool,
    /// Branch ids permitted to view this thread; empty means unrestricted.
    pub allowed_branches: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Thread {
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p.user_id == user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub sender: Participant,
    pub recipient: Participant,
    pub subject: String,
    pub content: String,
    pub priority: Priority,
    pub status: MessageStatus,
    pub is_read: bool,
    pub is_archived: bool,
    pub is_deleted: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub reply_to_message_id: Option<String>,
    pub is_reply: bool,
    pub allowed_branches: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub message_id: String,
    pub thread_id: String,
    pub recipient_id: String,
    pub recipient_type: Role,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_type: Role,
    #[serde(rename = "notification_type")]
    pub kind: NotificationKind,
    pub title: String,
    /// Content preview, truncated to 200 characters.
    pub message: String,
    pub subject: String,
    pub priority: Priority,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_accepts_legacy_superadmin_spelling() {
        let role: Role = serde_json::from_str("\"super_admin\"").unwrap();
        assert_eq!(role, Role::Superadmin);
        let role: Role = serde_json::from_str("\"superadmin\"").unwrap();
        assert_eq!(role, Role::Superadmin);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"superadmin\"");
    }

    #[test]
    fn enum_strings_round_trip() {
        for role in [Role::Student, Role::Coach, Role::BranchManager, Role::Superadmin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        for status in [
            MessageStatus::Sent,
            MessageStatus::Delivered,
            MessageStatus::Read,
            MessageStatus::Archived,
            MessageStatus::Deleted,
        ] {
            assert_eq!(MessageStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(Priority::parse("urgent"), Some(Priority::Urgent));
        assert_eq!(Role::parse("teacher"), None);
    }
}
