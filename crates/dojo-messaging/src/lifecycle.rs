//! Message lifecycle: sending, conversation and thread listings, flag
//! updates, per-user stats.

use anyhow::Context;
use chrono::Utc;
use dojo_db::Database;
use dojo_db::models::MessageRow;
use dojo_types::api::{
    ConversationSummary, ConversationsResponse, MessagePatch, MessageStats, SendMessageRequest,
    SendReceipt, ThreadMessagesResponse,
};
use dojo_types::models::{Actor, Message, Participant, Thread};
use uuid::Uuid;

use crate::error::{MessagingError, Result};
use crate::{access, notify, threads};

/// The full send path: access check, thread resolution, transactional
/// insert + thread aggregate update, then best-effort notification.
/// On any error nothing is persisted.
pub fn send_message(db: &Database, actor: &Actor, req: &SendMessageRequest) -> Result<SendReceipt> {
    if req.subject.trim().is_empty() {
        return Err(MessagingError::Validation("subject must not be empty".into()));
    }
    if req.content.trim().is_empty() {
        return Err(MessagingError::Validation("content must not be empty".into()));
    }

    // Targeting an existing thread counts as a reply for authorization
    // purposes even without a reply pointer.
    let is_reply_context = req.reply_to_message_id.is_some() || req.thread_id.is_some();

    let recipient = access::validate_recipient(
        db,
        actor,
        &req.recipient_id,
        req.recipient_type,
        is_reply_context,
    )?;

    let sender = Participant {
        user_id: actor.id.clone(),
        user_type: actor.role,
        user_name: actor.name.clone(),
        user_email: actor.email.clone(),
        branch_id: actor.branch_id.clone(),
    };

    let now = Utc::now();
    let thread_id = threads::resolve(db, &sender, &recipient, req, now)?;

    let allowed_branches = serde_json::to_string(&threads::branch_union(
        sender.branch_id.as_deref(),
        recipient.branch_id.as_deref(),
    ))
    .context("serialize allowed_branches")?;

    let row = MessageRow {
        id: Uuid::new_v4().to_string(),
        thread_id: thread_id.clone(),
        sender_id: sender.user_id,
        sender_type: sender.user_type.as_str().to_string(),
        sender_name: sender.user_name,
        sender_email: sender.user_email,
        sender_branch_id: sender.branch_id,
        recipient_id: recipient.user_id,
        recipient_type: recipient.user_type.as_str().to_string(),
        recipient_name: recipient.user_name,
        recipient_email: recipient.user_email,
        recipient_branch_id: recipient.branch_id,
        subject: req.subject.clone(),
        content: req.content.clone(),
        priority: req.priority.as_str().to_string(),
        status: "sent".to_string(),
        is_read: false,
        is_archived: false,
        is_deleted: false,
        read_at: None,
        reply_to_message_id: req.reply_to_message_id.clone(),
        is_reply: req.reply_to_message_id.is_some(),
        allowed_branches,
        created_at: now.to_rfc3339(),
        updated_at: now.to_rfc3339(),
    };

    db.insert_message_and_touch_thread(&row)?;

    // Best-effort fan-out; never fails the send.
    notify::dispatch(db, &row);

    Ok(SendReceipt {
        message_id: row.id,
        thread_id,
    })
}

/// Non-archived conversations the actor participates in, newest activity
/// first. Non-superadmins with a branch only see threads their branch is
/// allowed to view (an empty allowed set means unrestricted).
pub fn conversations(
    db: &Database,
    actor: &Actor,
    skip: i64,
    limit: i64,
) -> Result<ConversationsResponse> {
    let mut visible: Vec<Thread> = Vec::new();
    for row in db.threads_for_user(&actor.id)? {
        let thread = row.into_thread()?;
        if branch_visible(actor, &thread) {
            visible.push(thread);
        }
    }

    let total_count = visible.len() as i64;
    let mut conversations = Vec::new();
    for thread in visible
        .into_iter()
        .skip(skip.max(0) as usize)
        .take(limit.max(0) as usize)
    {
        let unread_count = db.count_unread_in_thread(&thread.id, &actor.id)?;
        let last_message = match &thread.last_message_id {
            Some(id) => match db.find_message(id)? {
                Some(row) => Some(row.into_message()?),
                None => None,
            },
            None => None,
        };
        conversations.push(ConversationSummary {
            thread_id: thread.id,
            subject: thread.subject,
            participants: thread.participants,
            message_count: thread.message_count,
            last_message,
            last_message_at: thread.last_message_at,
            unread_count,
            is_archived: thread.is_archived,
            created_at: thread.created_at,
            updated_at: thread.updated_at,
        });
    }

    Ok(ConversationsResponse {
        conversations,
        total_count,
        skip,
        limit,
    })
}

fn branch_visible(actor: &Actor, thread: &Thread) -> bool {
    if actor.is_superadmin() {
        return true;
    }
    match &actor.branch_id {
        Some(branch_id) => {
            thread.allowed_branches.is_empty() || thread.allowed_branches.contains(branch_id)
        }
        None => true,
    }
}

/// Messages of one thread, oldest first, soft-deleted rows excluded.
/// Side effect: every listed message addressed to the actor and still
/// unread is marked read. Sender-authored messages are untouched.
pub fn thread_messages(
    db: &Database,
    actor: &Actor,
    thread_id: &str,
    skip: i64,
    limit: i64,
) -> Result<ThreadMessagesResponse> {
    let thread = db
        .find_thread(thread_id)?
        .ok_or(MessagingError::NotFound("thread"))?
        .into_thread()?;

    if !thread.has_participant(&actor.id) && !actor.is_superadmin() {
        return Err(MessagingError::not_owner(
            "Access denied to this conversation",
        ));
    }

    let mut messages: Vec<Message> = Vec::new();
    for row in db.thread_messages(thread_id, skip, limit)? {
        messages.push(row.into_message()?);
    }

    let inbound_unread: Vec<String> = messages
        .iter()
        .filter(|m| m.recipient.user_id == actor.id && !m.is_read)
        .map(|m| m.id.clone())
        .collect();
    db.mark_messages_read(&inbound_unread, &Utc::now().to_rfc3339())?;

    let total_count = db.count_thread_messages(thread_id)?;

    Ok(ThreadMessagesResponse {
        messages,
        thread,
        total_count,
        skip,
        limit,
    })
}

/// Flag patch under ownership: only the message's recipient or a superadmin.
/// Flags are orthogonal; the derived status follows the strongest patched
/// flag unless the patch names a status explicitly.
pub fn update_message(
    db: &Database,
    actor: &Actor,
    message_id: &str,
    patch: &MessagePatch,
) -> Result<()> {
    let row = db
        .find_message(message_id)?
        .ok_or(MessagingError::NotFound("message"))?;

    if row.recipient_id != actor.id && !actor.is_superadmin() {
        return Err(MessagingError::not_owner("Access denied"));
    }

    let now = Utc::now().to_rfc3339();
    let is_read = patch.is_read.unwrap_or(row.is_read);
    let is_archived = patch.is_archived.unwrap_or(row.is_archived);
    let is_deleted = patch.is_deleted.unwrap_or(row.is_deleted);

    let status = if let Some(status) = patch.status {
        status.as_str().to_string()
    } else if patch.is_deleted == Some(true) {
        "deleted".to_string()
    } else if patch.is_archived == Some(true) {
        "archived".to_string()
    } else if patch.is_read == Some(true) {
        "read".to_string()
    } else {
        row.status.clone()
    };

    let read_at = match patch.is_read {
        Some(true) => Some(now.clone()),
        Some(false) => None,
        None => row.read_at.clone(),
    };

    db.update_message_flags(
        message_id,
        is_read,
        is_archived,
        is_deleted,
        &status,
        read_at.as_deref(),
        &now,
    )?;
    Ok(())
}

pub fn message_stats(db: &Database, actor: &Actor) -> Result<MessageStats> {
    Ok(MessageStats {
        total_messages: db.count_total_messages(&actor.id)?,
        unread_messages: db.count_unread_messages(&actor.id)?,
        sent_messages: db.count_sent_messages(&actor.id)?,
        received_messages: db.count_received_messages(&actor.id)?,
        archived_messages: db.count_archived_messages(&actor.id)?,
        deleted_messages: db.count_deleted_messages(&actor.id)?,
        active_conversations: db.count_active_threads(&actor.id)?,
    })
}
