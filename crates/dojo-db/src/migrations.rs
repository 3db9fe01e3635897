use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Identity directory. These tables are written by the wider academy
        -- system (enrollment, staff management); the messaging core only
        -- reads them.

        CREATE TABLE IF NOT EXISTS students (
            id          TEXT PRIMARY KEY,
            full_name   TEXT NOT NULL,
            email       TEXT NOT NULL,
            branch_id   TEXT,
            is_active   INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS coaches (
            id          TEXT PRIMARY KEY,
            full_name   TEXT NOT NULL,
            email       TEXT NOT NULL,
            branch_id   TEXT,
            is_active   INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS branch_managers (
            id          TEXT PRIMARY KEY,
            full_name   TEXT NOT NULL,
            email       TEXT NOT NULL,
            branch_id   TEXT,
            is_active   INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS superadmins (
            id          TEXT PRIMARY KEY,
            full_name   TEXT NOT NULL,
            email       TEXT NOT NULL,
            is_active   INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS branches (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            manager_id  TEXT,
            is_active   INTEGER NOT NULL DEFAULT 1
        );

        CREATE INDEX IF NOT EXISTS idx_branches_manager
            ON branches(manager_id);

        CREATE TABLE IF NOT EXISTS enrollments (
            id          TEXT PRIMARY KEY,
            student_id  TEXT NOT NULL,
            branch_id   TEXT NOT NULL,
            is_active   INTEGER NOT NULL DEFAULT 1
        );

        CREATE INDEX IF NOT EXISTS idx_enrollments_student
            ON enrollments(student_id);
        CREATE INDEX IF NOT EXISTS idx_enrollments_branch
            ON enrollments(branch_id);

        -- Messaging state.

        CREATE TABLE IF NOT EXISTS threads (
            id               TEXT PRIMARY KEY,
            subject          TEXT NOT NULL,
            participant_low  TEXT NOT NULL,
            participant_high TEXT NOT NULL,
            participants     TEXT NOT NULL,
            message_count    INTEGER NOT NULL DEFAULT 0,
            last_message_id  TEXT,
            last_message_at  TEXT,
            last_sender_id   TEXT,
            is_active        INTEGER NOT NULL DEFAULT 1,
            is_archived      INTEGER NOT NULL DEFAULT 0,
            allowed_branches TEXT NOT NULL DEFAULT '[]',
            created_at       TEXT NOT NULL,
            updated_at       TEXT NOT NULL
        );

        -- Backs find-or-create: two concurrent first messages between the
        -- same pair on the same subject collapse into one thread. Partial so
        -- an archived conversation does not block a fresh one.
        CREATE UNIQUE INDEX IF NOT EXISTS idx_threads_pair_subject
            ON threads(participant_low, participant_high, subject)
            WHERE is_archived = 0;

        CREATE INDEX IF NOT EXISTS idx_threads_participants
            ON threads(participant_low, participant_high);

        CREATE TABLE IF NOT EXISTS messages (
            id                  TEXT PRIMARY KEY,
            thread_id           TEXT NOT NULL REFERENCES threads(id),
            sender_id           TEXT NOT NULL,
            sender_type         TEXT NOT NULL,
            sender_name         TEXT NOT NULL,
            sender_email        TEXT NOT NULL,
            sender_branch_id    TEXT,
            recipient_id        TEXT NOT NULL,
            recipient_type      TEXT NOT NULL,
            recipient_name      TEXT NOT NULL,
            recipient_email     TEXT NOT NULL,
            recipient_branch_id TEXT,
            subject             TEXT NOT NULL,
            content             TEXT NOT NULL,
            priority            TEXT NOT NULL,
            status              TEXT NOT NULL,
            is_read             INTEGER NOT NULL DEFAULT 0,
            is_archived         INTEGER NOT NULL DEFAULT 0,
            is_deleted          INTEGER NOT NULL DEFAULT 0,
            read_at             TEXT,
            reply_to_message_id TEXT,
            is_reply            INTEGER NOT NULL DEFAULT 0,
            allowed_branches    TEXT NOT NULL DEFAULT '[]',
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_thread
            ON messages(thread_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_messages_recipient
            ON messages(recipient_id, is_read);
        CREATE INDEX IF NOT EXISTS idx_messages_sender
            ON messages(sender_id);

        CREATE TABLE IF NOT EXISTS notifications (
            id             TEXT PRIMARY KEY,
            message_id     TEXT NOT NULL,
            thread_id      TEXT NOT NULL,
            recipient_id   TEXT NOT NULL,
            recipient_type TEXT NOT NULL,
            sender_id      TEXT NOT NULL,
            sender_name    TEXT NOT NULL,
            sender_type    TEXT NOT NULL,
            kind           TEXT NOT NULL,
            title          TEXT NOT NULL,
            body           TEXT NOT NULL,
            subject        TEXT NOT NULL,
            priority       TEXT NOT NULL,
            is_read        INTEGER NOT NULL DEFAULT 0,
            read_at        TEXT,
            created_at     TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_recipient
            ON notifications(recipient_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
