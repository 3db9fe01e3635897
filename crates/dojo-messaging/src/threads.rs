//! Thread resolution: all correspondence between the same two people on the
//! same logical subject collapses into one thread, however many "Re: "
//! prefixes have accumulated. Explicit thread ids and reply pointers
//! short-circuit the search.

use anyhow::Context;
use chrono::{DateTime, Utc};
use dojo_db::Database;
use dojo_db::models::ThreadRow;
use dojo_db::queries::participant_pair;
use dojo_types::api::SendMessageRequest;
use dojo_types::models::Participant;
use uuid::Uuid;

use crate::error::{MessagingError, Result};

/// Strip one leading "Re: " to obtain the base subject.
pub fn normalize_subject(subject: &str) -> &str {
    subject.strip_prefix("Re: ").unwrap_or(subject)
}

/// Union of the two participants' branch ids. Empty means the thread is
/// unrestricted (e.g. a superadmin with no branch on either side).
pub fn branch_union(a: Option<&str>, b: Option<&str>) -> Vec<String> {
    let mut branches = Vec::new();
    for id in [a, b].into_iter().flatten() {
        if !branches.iter().any(|x| x == id) {
            branches.push(id.to_string());
        }
    }
    branches
}

/// Resolution order, first match wins: explicit thread id, the reply
/// target's thread, a pair+subject search, then creation.
pub fn resolve(
    db: &Database,
    sender: &Participant,
    recipient: &Participant,
    req: &SendMessageRequest,
    now: DateTime<Utc>,
) -> Result<String> {
    if let Some(thread_id) = &req.thread_id {
        if db.find_thread(thread_id)?.is_none() {
            return Err(MessagingError::NotFound("thread"));
        }
        return Ok(thread_id.clone());
    }

    if let Some(reply_to) = &req.reply_to_message_id {
        if let Some(thread_id) = db.thread_id_of_message(reply_to)? {
            return Ok(thread_id);
        }
    }

    let base_subject = normalize_subject(&req.subject);
    if let Some(existing) =
        db.find_thread_by_pair_subject(&sender.user_id, &recipient.user_id, base_subject)?
    {
        return Ok(existing.id);
    }

    create(db, sender, recipient, base_subject, now)
}

fn create(
    db: &Database,
    sender: &Participant,
    recipient: &Participant,
    base_subject: &str,
    now: DateTime<Utc>,
) -> Result<String> {
    let (low, high) = participant_pair(&sender.user_id, &recipient.user_id);
    let participants =
        serde_json::to_string(&[sender, recipient]).context("serialize participants")?;
    let allowed_branches = serde_json::to_string(&branch_union(
        sender.branch_id.as_deref(),
        recipient.branch_id.as_deref(),
    ))
    .context("serialize allowed_branches")?;

    let row = ThreadRow {
        id: Uuid::new_v4().to_string(),
        subject: base_subject.to_string(),
        participant_low: low.to_string(),
        participant_high: high.to_string(),
        participants,
        message_count: 0,
        last_message_id: None,
        last_message_at: None,
        last_sender_id: None,
        is_active: true,
        is_archived: false,
        allowed_branches,
        created_at: now.to_rfc3339(),
        updated_at: now.to_rfc3339(),
    };

    if db.try_insert_thread(&row)? {
        return Ok(row.id);
    }

    // Lost the find-or-create race: a concurrent send committed the thread
    // between our search and insert. Re-resolve against the winner.
    match db.find_thread_by_pair_subject(&sender.user_id, &recipient.user_id, base_subject)? {
        Some(existing) => Ok(existing.id),
        None => Err(MessagingError::Conflict),
    }
}
