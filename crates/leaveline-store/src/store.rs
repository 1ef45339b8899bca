use std::str::FromStr;
use std::sync::Mutex;

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use tracing::{debug, instrument};
use uuid::Uuid;

use leaveline_core::types::{Decision, LeaveStatus, LeaveType};

use crate::error::{Result, StoreError};
use crate::types::{LeaveApplication, NewApplication};

const APPLICATION_COLUMNS: &str = "id, applicant_name, applicant_phone, leave_type, date_start, \
     date_end, reason, status, reviewer_name, comments, created_at, decided_at";

/// Thread-safe store for leave applications.
///
/// Wraps a single SQLite connection in a `Mutex` — sufficient for the
/// single-node deployment target.
pub struct LeaveStore {
    db: Mutex<Connection>,
}

impl LeaveStore {
    /// Wrap an already-open (and `init_db`-initialised) connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// Persist a new application in the pending state.
    #[instrument(skip(self, new), fields(applicant = %new.applicant_name))]
    pub fn create(&self, new: NewApplication) -> Result<LeaveApplication> {
        let application = LeaveApplication {
            id: Uuid::now_v7().to_string(),
            applicant_name: new.applicant_name,
            applicant_phone: new.applicant_phone,
            leave_type: new.leave_type,
            date_start: new.date_start,
            date_end: new.date_end,
            reason: new.reason,
            status: LeaveStatus::Pending,
            reviewer_name: None,
            comments: None,
            created_at: chrono::Utc::now().to_rfc3339(),
            decided_at: None,
        };

        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO applications
             (id, applicant_name, applicant_phone, leave_type, date_start,
              date_end, reason, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                application.id,
                application.applicant_name,
                application.applicant_phone,
                application.leave_type.to_string(),
                application.date_start.to_string(),
                application.date_end.to_string(),
                application.reason,
                application.status.to_string(),
                application.created_at,
            ],
        )?;

        debug!(id = %application.id, "application created");
        Ok(application)
    }

    /// Load an application by primary key.
    pub fn get(&self, id: &str) -> Result<Option<LeaveApplication>> {
        let db = self.db.lock().unwrap();
        fetch(&db, id)
    }

    /// List applications, optionally filtered by status, newest first.
    pub fn list(&self, status: Option<LeaveStatus>) -> Result<Vec<LeaveApplication>> {
        let db = self.db.lock().unwrap();
        let mut out = Vec::new();
        match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {APPLICATION_COLUMNS} FROM applications
                     WHERE status = ?1 ORDER BY created_at DESC"
                );
                let mut stmt = db.prepare(&sql)?;
                let rows = stmt.query_map(params![status.to_string()], row_to_application)?;
                for row in rows {
                    out.push(row?);
                }
            }
            None => {
                let sql = format!(
                    "SELECT {APPLICATION_COLUMNS} FROM applications ORDER BY created_at DESC"
                );
                let mut stmt = db.prepare(&sql)?;
                let rows = stmt.query_map([], row_to_application)?;
                for row in rows {
                    out.push(row?);
                }
            }
        }
        Ok(out)
    }

    /// Apply a reviewer's decision to a pending application.
    ///
    /// The pending -> approved/rejected transition is the only legal one;
    /// deciding an already decided application fails. Returns the updated
    /// record, which the caller renders into the outbound notification —
    /// notification failure never rolls this transition back.
    #[instrument(skip(self, reviewer_name, comments))]
    pub fn decide(
        &self,
        id: &str,
        decision: Decision,
        reviewer_name: &str,
        comments: Option<&str>,
    ) -> Result<LeaveApplication> {
        let decided_at = chrono::Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();

        // The status predicate is the transition guard: a concurrent
        // decide that lost the race matches zero rows here, so the
        // affected-row count is authoritative.
        let changed = db.execute(
            "UPDATE applications
             SET status = ?2, reviewer_name = ?3, comments = ?4, decided_at = ?5
             WHERE id = ?1 AND status = 'pending'",
            params![
                id,
                decision.as_status().to_string(),
                reviewer_name,
                comments,
                decided_at,
            ],
        )?;

        if changed == 0 {
            return match fetch(&db, id)? {
                None => Err(StoreError::NotFound { id: id.to_string() }),
                Some(current) => Err(StoreError::InvalidTransition {
                    id: id.to_string(),
                    status: current.status.to_string(),
                }),
            };
        }

        let updated = fetch(&db, id)?.ok_or_else(|| StoreError::NotFound {
            id: id.to_string(),
        })?;
        drop(db);

        debug!(id = %id, decision = %decision, "application decided");
        Ok(updated)
    }
}

fn fetch(db: &Connection, id: &str) -> Result<Option<LeaveApplication>> {
    let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ?1");
    match db.query_row(&sql, params![id], row_to_application) {
        Ok(app) => Ok(Some(app)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(StoreError::Database(e)),
    }
}

/// Map a row to an application. Columns that no longer parse back into
/// their domain enums surface as SQLite conversion failures.
fn row_to_application(row: &Row<'_>) -> rusqlite::Result<LeaveApplication> {
    let leave_type_raw: String = row.get(3)?;
    let date_start_raw: String = row.get(4)?;
    let date_end_raw: String = row.get(5)?;
    let status_raw: String = row.get(7)?;

    Ok(LeaveApplication {
        id: row.get(0)?,
        applicant_name: row.get(1)?,
        applicant_phone: row.get(2)?,
        leave_type: LeaveType::from_str(&leave_type_raw)
            .map_err(|e| conversion_failure(3, e))?,
        date_start: NaiveDate::from_str(&date_start_raw)
            .map_err(|e| conversion_failure(4, e.to_string()))?,
        date_end: NaiveDate::from_str(&date_end_raw)
            .map_err(|e| conversion_failure(5, e.to_string()))?,
        reason: row.get(6)?,
        status: LeaveStatus::from_str(&status_raw).map_err(|e| conversion_failure(7, e))?,
        reviewer_name: row.get(8)?,
        comments: row.get(9)?,
        created_at: row.get(10)?,
        decided_at: row.get(11)?,
    })
}

fn conversion_failure(column: usize, detail: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        detail.into(),
    )
}
