//! Database row types — these map directly to SQLite rows.
//! Distinct from the dojo-types domain models to keep the DB layer
//! independent; `into_*` converters parse the string-typed columns once,
//! next to the rows they belong to.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use dojo_types::models::{
    Message, MessageStatus, Notification, NotificationKind, Participant, Priority, Role, Thread,
};

/// A directory entry: student, coach, branch manager or superadmin.
#[derive(Debug, Clone)]
pub struct ContactRow {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub branch_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BranchRow {
    pub id: String,
    pub name: String,
    pub manager_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EnrollmentRow {
    pub student_id: String,
    pub branch_id: String,
}

#[derive(Debug, Clone)]
pub struct ThreadRow {
    pub id: String,
    pub subject: String,
    pub participant_low: String,
    pub participant_high: String,
    pub participants: String,
    pub message_count: i64,
    pub last_message_id: Option<String>,
    pub last_message_at: Option<String>,
    pub last_sender_id: Option<String>,
    pub is_active: bool,
    pub is_archived: bool,
    pub allowed_branches: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: String,
    pub thread_id: String,
    pub sender_id: String,
    pub sender_type: String,
    pub sender_name: String,
    pub sender_email: String,
    pub sender_branch_id: Option<String>,
    pub recipient_id: String,
    pub recipient_type: String,
    pub recipient_name: String,
    pub recipient_email: String,
    pub recipient_branch_id: Option<String>,
    pub subject: String,
    pub content: String,
    pub priority: String,
    pub status: String,
    pub is_read: bool,
    pub is_archived: bool,
    pub is_deleted: bool,
    pub read_at: Option<String>,
    pub reply_to_message_id: Option<String>,
    pub is_reply: bool,
    pub allowed_branches: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NotificationRow {
    pub id: String,
    pub message_id: String,
    pub thread_id: String,
    pub recipient_id: String,
    pub recipient_type: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_type: String,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub subject: String,
    pub priority: String,
    pub is_read: bool,
    pub read_at: Option<String>,
    pub created_at: String,
}

/// All timestamps are written by us as RFC 3339, so read-back is exact.
pub(crate) fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("bad timestamp '{s}'"))
}

pub(crate) fn parse_ts_opt(s: &Option<String>) -> Result<Option<DateTime<Utc>>> {
    s.as_deref().map(parse_ts).transpose()
}

fn parse_role(s: &str) -> Result<Role> {
    Role::parse(s).ok_or_else(|| anyhow!("unknown role '{s}'"))
}

impl ThreadRow {
    pub fn into_thread(self) -> Result<Thread> {
        let participants: Vec<Participant> = serde_json::from_str(&self.participants)
            .with_context(|| format!("corrupt participants on thread {}", self.id))?;
        let allowed_branches: Vec<String> = serde_json::from_str(&self.allowed_branches)
            .with_context(|| format!("corrupt allowed_branches on thread {}", self.id))?;

        Ok(Thread {
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
            last_message_at: parse_ts_opt(&self.last_message_at)?,
            id: self.id,
            subject: self.subject,
            participants,
            message_count: self.message_count,
            last_message_id: self.last_message_id,
            last_sender_id: self.last_sender_id,
            is_active: self.is_active,
            is_archived: self.is_archived,
            allowed_branches,
        })
    }
}

impl MessageRow {
    pub fn into_message(self) -> Result<Message> {
        let allowed_branches: Vec<String> = serde_json::from_str(&self.allowed_branches)
            .with_context(|| format!("corrupt allowed_branches on message {}", self.id))?;

        Ok(Message {
            sender: Participant {
                user_id: self.sender_id,
                user_type: parse_role(&self.sender_type)?,
                user_name: self.sender_name,
                user_email: self.sender_email,
                branch_id: self.sender_branch_id,
            },
            recipient: Participant {
                user_id: self.recipient_id,
                user_type: parse_role(&self.recipient_type)?,
                user_name: self.recipient_name,
                user_email: self.recipient_email,
                branch_id: self.recipient_branch_id,
            },
            priority: Priority::parse(&self.priority)
                .ok_or_else(|| anyhow!("unknown priority '{}'", self.priority))?,
            status: MessageStatus::parse(&self.status)
                .ok_or_else(|| anyhow!("unknown status '{}'", self.status))?,
            read_at: parse_ts_opt(&self.read_at)?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
            id: self.id,
            thread_id: self.thread_id,
            subject: self.subject,
            content: self.content,
            is_read: self.is_read,
            is_archived: self.is_archived,
            is_deleted: self.is_deleted,
            reply_to_message_id: self.reply_to_message_id,
            is_reply: self.is_reply,
            allowed_branches,
        })
    }
}

impl NotificationRow {
    pub fn into_notification(self) -> Result<Notification> {
        Ok(Notification {
            recipient_type: parse_role(&self.recipient_type)?,
            sender_type: parse_role(&self.sender_type)?,
            kind: NotificationKind::parse(&self.kind)
                .ok_or_else(|| anyhow!("unknown notification kind '{}'", self.kind))?,
            priority: Priority::parse(&self.priority)
                .ok_or_else(|| anyhow!("unknown priority '{}'", self.priority))?,
            read_at: parse_ts_opt(&self.read_at)?,
            created_at: parse_ts(&self.created_at)?,
            id: self.id,
            message_id: self.message_id,
            thread_id: self.thread_id,
            recipient_id: self.recipient_id,
            sender_id: self.sender_id,
            sender_name: self.sender_name,
            title: self.title,
            message: self.body,
            subject: self.subject,
            is_read: self.is_read,
        })
    }
}
