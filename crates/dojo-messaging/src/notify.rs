//! Notification fan-out. One record per delivered message, created on a
//! best-effort basis: a failure here is logged and swallowed, never
//! propagated into the send path.

use chrono::Utc;
use dojo_db::Database;
use dojo_db::models::{MessageRow, NotificationRow};
use dojo_types::api::NotificationsResponse;
use dojo_types::models::{Actor, Notification, NotificationKind};
use tracing::warn;
use uuid::Uuid;

use crate::error::{MessagingError, Result};

const PREVIEW_CHARS: usize = 200;

/// Content preview for the notification body: the first 200 characters,
/// with an ellipsis when anything was cut.
fn preview(content: &str) -> String {
    let mut chars = content.char_indices();
    match chars.nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

/// Create the recipient's notification for a freshly stored message.
/// Best-effort by contract.
pub fn dispatch(db: &Database, message: &MessageRow) {
    let kind = if message.reply_to_message_id.is_some() {
        NotificationKind::MessageReply
    } else {
        NotificationKind::NewMessage
    };
    let title = match kind {
        NotificationKind::NewMessage => format!("New message from {}", message.sender_name),
        NotificationKind::MessageReply => format!("Reply from {}", message.sender_name),
    };

    let row = NotificationRow {
        id: Uuid::new_v4().to_string(),
        message_id: message.id.clone(),
        thread_id: message.thread_id.clone(),
        recipient_id: message.recipient_id.clone(),
        recipient_type: message.recipient_type.clone(),
        sender_id: message.sender_id.clone(),
        sender_name: message.sender_name.clone(),
        sender_type: message.sender_type.clone(),
        kind: kind.as_str().to_string(),
        title,
        body: preview(&message.content),
        subject: message.subject.clone(),
        priority: message.priority.clone(),
        is_read: false,
        read_at: None,
        created_at: Utc::now().to_rfc3339(),
    };

    if let Err(err) = db.insert_notification(&row) {
        warn!(message_id = %message.id, "failed to create message notification: {err:#}");
    }
}

/// The actor's notifications, newest first, with total and unread counts.
pub fn notifications(
    db: &Database,
    actor: &Actor,
    skip: i64,
    limit: i64,
) -> Result<NotificationsResponse> {
    let mut notifications: Vec<Notification> = Vec::new();
    for row in db.notifications_for(&actor.id, skip, limit)? {
        notifications.push(row.into_notification()?);
    }
    let total = db.count_notifications(&actor.id)?;
    let unread_count = db.count_unread_notifications(&actor.id)?;

    Ok(NotificationsResponse {
        notifications,
        total,
        unread_count,
    })
}

/// Recipient-scoped read marking. A foreign or unknown id reads as
/// not-found; nothing leaks about other users' notifications.
pub fn mark_notification_read(db: &Database, actor: &Actor, notification_id: &str) -> Result<()> {
    let updated =
        db.mark_notification_read(notification_id, &actor.id, &Utc::now().to_rfc3339())?;
    if !updated {
        return Err(MessagingError::NotFound("notification"));
    }
    Ok(())
}
