use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use leaveline_core::types::{LeaveStatus, LeaveType};

/// Fields supplied by the applicant when submitting a request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewApplication {
    pub applicant_name: String,
    /// E.164 phone number used as the notification destination.
    pub applicant_phone: String,
    pub leave_type: LeaveType,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub reason: Option<String>,
}

/// A persisted leave application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveApplication {
    /// UUIDv7 primary key — time-sortable.
    pub id: String,
    pub applicant_name: String,
    pub applicant_phone: String,
    pub leave_type: LeaveType,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub reason: Option<String>,
    pub status: LeaveStatus,
    /// Set by the decision that moved the application out of pending.
    pub reviewer_name: Option<String>,
    pub comments: Option<String>,
    /// RFC3339 submission timestamp.
    pub created_at: String,
    /// RFC3339 decision timestamp, None while pending.
    pub decided_at: Option<String>,
}
