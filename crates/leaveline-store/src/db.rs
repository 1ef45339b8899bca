use rusqlite::{Connection, Result};

/// Initialise the applications table. Safe to call on every startup (idempotent).
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS applications (
            id               TEXT PRIMARY KEY,
            applicant_name   TEXT NOT NULL,
            applicant_phone  TEXT NOT NULL,
            leave_type       TEXT NOT NULL,
            date_start       TEXT NOT NULL,
            date_end         TEXT NOT NULL,
            reason           TEXT,
            status           TEXT NOT NULL DEFAULT 'pending',
            reviewer_name    TEXT,
            comments         TEXT,
            created_at       TEXT NOT NULL,
            decided_at       TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_applications_status
            ON applications(status);",
    )
}
