//! Messaging-state queries: threads, messages, notifications.

use crate::Database;
use crate::models::{MessageRow, NotificationRow, ThreadRow};
use anyhow::{Result, anyhow, bail};
use rusqlite::Row;

/// Order-independent participant key: threads store the pair sorted so that
/// (a, b) and (b, a) address the same row.
pub fn participant_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b { (a, b) } else { (b, a) }
}

const THREAD_COLS: &str = "id, subject, participant_low, participant_high, participants, \
     message_count, last_message_id, last_message_at, last_sender_id, \
     is_active, is_archived, allowed_branches, created_at, updated_at";

const MESSAGE_COLS: &str = "id, thread_id, \
     sender_id, sender_type, sender_name, sender_email, sender_branch_id, \
     recipient_id, recipient_type, recipient_name, recipient_email, recipient_branch_id, \
     subject, content, priority, status, is_read, is_archived, is_deleted, read_at, \
     reply_to_message_id, is_reply, allowed_branches, created_at, updated_at";

const NOTIFICATION_COLS: &str = "id, message_id, thread_id, recipient_id, recipient_type, \
     sender_id, sender_name, sender_type, kind, title, body, subject, priority, \
     is_read, read_at, created_at";

impl Database {
    // -- Threads --

    pub fn find_thread(&self, id: &str) -> Result<Option<ThreadRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {THREAD_COLS} FROM threads WHERE id = ?1");
            let row = conn.query_row(&sql, [id], thread_from_row).optional()?;
            Ok(row)
        })
    }

    /// Participant-pair + subject search among non-archived threads. Matches
    /// the stored subject either bare or with one "Re: " prefix.
    pub fn find_thread_by_pair_subject(
        &self,
        user_a: &str,
        user_b: &str,
        base_subject: &str,
    ) -> Result<Option<ThreadRow>> {
        let (low, high) = participant_pair(user_a, user_b);
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {THREAD_COLS} FROM threads
                 WHERE participant_low = ?1 AND participant_high = ?2
                   AND is_archived = 0
                   AND (subject = ?3 OR subject = 'Re: ' || ?3)
                 LIMIT 1"
            );
            let row = conn
                .query_row(&sql, [low, high, base_subject], thread_from_row)
                .optional()?;
            Ok(row)
        })
    }

    /// Any thread (archived included) between the two users, regardless of
    /// subject. Backs the coach-reply branch-mismatch override.
    pub fn any_thread_between(&self, user_a: &str, user_b: &str) -> Result<bool> {
        let (low, high) = participant_pair(user_a, user_b);
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM threads
                     WHERE participant_low = ?1 AND participant_high = ?2)",
                [low, high],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    /// Insert a thread; returns false when the (pair, subject) unique index
    /// rejects it, meaning a concurrent send already created the thread.
    pub fn try_insert_thread(&self, thread: &ThreadRow) -> Result<bool> {
        self.with_conn(|conn| {
            let result = conn.execute(
                "INSERT INTO threads (id, subject, participant_low, participant_high, \
                     participants, message_count, last_message_id, last_message_at, \
                     last_sender_id, is_active, is_archived, allowed_branches, \
                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                rusqlite::params![
                    thread.id,
                    thread.subject,
                    thread.participant_low,
                    thread.participant_high,
                    thread.participants,
                    thread.message_count,
                    thread.last_message_id,
                    thread.last_message_at,
                    thread.last_sender_id,
                    thread.is_active,
                    thread.is_archived,
                    thread.allowed_branches,
                    thread.created_at,
                    thread.updated_at,
                ],
            );
            match result {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Non-archived threads the user participates in, most recent activity
    /// first.
    pub fn threads_for_user(&self, user_id: &str) -> Result<Vec<ThreadRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {THREAD_COLS} FROM threads
                 WHERE (participant_low = ?1 OR participant_high = ?1)
                   AND is_archived = 0
                 ORDER BY last_message_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], thread_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_active_threads(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM threads
                 WHERE (participant_low = ?1 OR participant_high = ?1)
                   AND is_active = 1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    // -- Messages --

    /// Insert the message and update its thread's aggregate in one
    /// transaction: either both persist or neither does. The counter is an
    /// in-place increment, never a read-modify-write.
    pub fn insert_message_and_touch_thread(&self, msg: &MessageRow) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO messages (id, thread_id, \
                     sender_id, sender_type, sender_name, sender_email, sender_branch_id, \
                     recipient_id, recipient_type, recipient_name, recipient_email, \
                     recipient_branch_id, subject, content, priority, status, \
                     is_read, is_archived, is_deleted, read_at, \
                     reply_to_message_id, is_reply, allowed_branches, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, \
                     ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25)",
                rusqlite::params![
                    msg.id,
                    msg.thread_id,
                    msg.sender_id,
                    msg.sender_type,
                    msg.sender_name,
                    msg.sender_email,
                    msg.sender_branch_id,
                    msg.recipient_id,
                    msg.recipient_type,
                    msg.recipient_name,
                    msg.recipient_email,
                    msg.recipient_branch_id,
                    msg.subject,
                    msg.content,
                    msg.priority,
                    msg.status,
                    msg.is_read,
                    msg.is_archived,
                    msg.is_deleted,
                    msg.read_at,
                    msg.reply_to_message_id,
                    msg.is_reply,
                    msg.allowed_branches,
                    msg.created_at,
                    msg.updated_at,
                ],
            )?;
            let touched = tx.execute(
                "UPDATE threads SET
                     last_message_id = ?1,
                     last_message_at = ?2,
                     last_sender_id = ?3,
                     updated_at = ?2,
                     message_count = message_count + 1
                 WHERE id = ?4",
                rusqlite::params![msg.id, msg.created_at, msg.sender_id, msg.thread_id],
            )?;
            if touched != 1 {
                bail!("thread {} vanished during send", msg.thread_id);
            }
            tx.commit()?;
            Ok(())
        })
    }

    pub fn find_message(&self, id: &str) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {MESSAGE_COLS} FROM messages WHERE id = ?1");
            let row = conn.query_row(&sql, [id], message_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn thread_id_of_message(&self, message_id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let id = conn
                .query_row(
                    "SELECT thread_id FROM messages WHERE id = ?1",
                    [message_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(id)
        })
    }

    /// Non-deleted messages of a thread, oldest first.
    pub fn thread_messages(
        &self,
        thread_id: &str,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLS} FROM messages
                 WHERE thread_id = ?1 AND is_deleted = 0
                 ORDER BY created_at ASC
                 LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![thread_id, limit, skip], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_thread_messages(&self, thread_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE thread_id = ?1 AND is_deleted = 0",
                [thread_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    pub fn count_unread_in_thread(&self, thread_id: &str, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM messages
                 WHERE thread_id = ?1 AND recipient_id = ?2
                   AND is_read = 0 AND is_deleted = 0",
                [thread_id, user_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    /// Bulk read-marking for the inbound side of a thread listing.
    pub fn mark_messages_read(&self, ids: &[String], now: &str) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (2..=ids.len() + 1).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "UPDATE messages
                 SET is_read = 1, read_at = ?1, status = 'read', updated_at = ?1
                 WHERE id IN ({})",
                placeholders.join(", ")
            );
            let mut params: Vec<&dyn rusqlite::types::ToSql> = vec![&now];
            params.extend(ids.iter().map(|id| id as &dyn rusqlite::types::ToSql));
            conn.execute(&sql, params.as_slice())?;
            Ok(())
        })
    }

    /// Write the full resolved flag state of a message. The caller computes
    /// final values from the patch; flags stay orthogonal columns.
    pub fn update_message_flags(
        &self,
        id: &str,
        is_read: bool,
        is_archived: bool,
        is_deleted: bool,
        status: &str,
        read_at: Option<&str>,
        updated_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE messages
                 SET is_read = ?2, is_archived = ?3, is_deleted = ?4,
                     status = ?5, read_at = ?6, updated_at = ?7
                 WHERE id = ?1",
                rusqlite::params![id, is_read, is_archived, is_deleted, status, read_at, updated_at],
            )?;
            if changed != 1 {
                return Err(anyhow!("message {} vanished during update", id));
            }
            Ok(())
        })
    }

    // -- Stats --

    pub fn count_total_messages(&self, user_id: &str) -> Result<i64> {
        self.count_where(
            "(sender_id = ?1 OR recipient_id = ?1) AND is_deleted = 0",
            user_id,
        )
    }

    pub fn count_unread_messages(&self, user_id: &str) -> Result<i64> {
        self.count_where("recipient_id = ?1 AND is_read = 0 AND is_deleted = 0", user_id)
    }

    pub fn count_sent_messages(&self, user_id: &str) -> Result<i64> {
        self.count_where("sender_id = ?1 AND is_deleted = 0", user_id)
    }

    pub fn count_received_messages(&self, user_id: &str) -> Result<i64> {
        self.count_where("recipient_id = ?1 AND is_deleted = 0", user_id)
    }

    pub fn count_archived_messages(&self, user_id: &str) -> Result<i64> {
        self.count_where(
            "recipient_id = ?1 AND is_archived = 1 AND is_deleted = 0",
            user_id,
        )
    }

    pub fn count_deleted_messages(&self, user_id: &str) -> Result<i64> {
        self.count_where(
            "(sender_id = ?1 OR recipient_id = ?1) AND is_deleted = 1",
            user_id,
        )
    }

    fn count_where(&self, predicate: &str, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let sql = format!("SELECT COUNT(*) FROM messages WHERE {predicate}");
            let n = conn.query_row(&sql, [user_id], |row| row.get(0))?;
            Ok(n)
        })
    }

    // -- Notifications --

    pub fn insert_notification(&self, n: &NotificationRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notifications (id, message_id, thread_id, recipient_id, \
                     recipient_type, sender_id, sender_name, sender_type, kind, title, \
                     body, subject, priority, is_read, read_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                rusqlite::params![
                    n.id,
                    n.message_id,
                    n.thread_id,
                    n.recipient_id,
                    n.recipient_type,
                    n.sender_id,
                    n.sender_name,
                    n.sender_type,
                    n.kind,
                    n.title,
                    n.body,
                    n.subject,
                    n.priority,
                    n.is_read,
                    n.read_at,
                    n.created_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn notifications_for(
        &self,
        user_id: &str,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {NOTIFICATION_COLS} FROM notifications
                 WHERE recipient_id = ?1
                 ORDER BY created_at DESC
                 LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    rusqlite::params![user_id, limit, skip],
                    notification_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_notifications(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    pub fn count_unread_notifications(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND is_read = 0",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    /// Recipient-scoped read marking; returns false when no owned
    /// notification matched the id.
    pub fn mark_notification_read(
        &self,
        id: &str,
        recipient_id: &str,
        now: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE notifications SET is_read = 1, read_at = ?3
                 WHERE id = ?1 AND recipient_id = ?2",
                [id, recipient_id, now],
            )?;
            Ok(changed > 0)
        })
    }
}

fn thread_from_row(row: &Row) -> rusqlite::Result<ThreadRow> {
    Ok(ThreadRow {
        id: row.get(0)?,
        subject: row.get(1)?,
        participant_low: row.get(2)?,
        participant_high: row.get(3)?,
        participants: row.get(4)?,
        message_count: row.get(5)?,
        last_message_id: row.get(6)?,
        last_message_at: row.get(7)?,
        last_sender_id: row.get(8)?,
        is_active: row.get(9)?,
        is_archived: row.get(10)?,
        allowed_branches: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn message_from_row(row: &Row) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        sender_id: row.get(2)?,
        sender_type: row.get(3)?,
        sender_name: row.get(4)?,
        sender_email: row.get(5)?,
        sender_branch_id: row.get(6)?,
        recipient_id: row.get(7)?,
        recipient_type: row.get(8)?,
        recipient_name: row.get(9)?,
        recipient_email: row.get(10)?,
        recipient_branch_id: row.get(11)?,
        subject: row.get(12)?,
        content: row.get(13)?,
        priority: row.get(14)?,
        status: row.get(15)?,
        is_read: row.get(16)?,
        is_archived: row.get(17)?,
        is_deleted: row.get(18)?,
        read_at: row.get(19)?,
        reply_to_message_id: row.get(20)?,
        is_reply: row.get(21)?,
        allowed_branches: row.get(22)?,
        created_at: row.get(23)?,
        updated_at: row.get(24)?,
    })
}

fn notification_from_row(row: &Row) -> rusqlite::Result<NotificationRow> {
    Ok(NotificationRow {
        id: row.get(0)?,
        message_id: row.get(1)?,
        thread_id: row.get(2)?,
        recipient_id: row.get(3)?,
        recipient_type: row.get(4)?,
        sender_id: row.get(5)?,
        sender_name: row.get(6)?,
        sender_type: row.get(7)?,
        kind: row.get(8)?,
        title: row.get(9)?,
        body: row.get(10)?,
        subject: row.get(11)?,
        priority: row.get(12)?,
        is_read: row.get(13)?,
        read_at: row.get(14)?,
        created_at: row.get(15)?,
    })
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
