use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use leaveline_core::types::{Decision, LeaveType};

use crate::error::RequestError;
use crate::format::status_change_body;

/// A channel's last known capability to attempt a send right now.
///
/// Written only by the channel's own initializer (pairing handshake,
/// startup credential validation); read lock-free by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    /// Not yet initialized (e.g. pairing handshake still outstanding).
    Uninitialized,
    /// Capable of attempting a send.
    Ready,
    /// Usable but impaired; the router still skips it.
    Degraded,
    /// Out of service for the process lifetime (e.g. rejected credentials).
    Unavailable,
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Readiness::Uninitialized => write!(f, "uninitialized"),
            Readiness::Ready => write!(f, "ready"),
            Readiness::Degraded => write!(f, "degraded"),
            Readiness::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// A leave-status transition rendered into a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub applicant_name: String,
    pub leave_type: LeaveType,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub status: Decision,
    pub reviewer_name: String,
    pub comments: String,
}

/// One outbound notification, immutable once constructed.
///
/// Construction is the single caller-visible failure point of the
/// notification subsystem: a missing destination or body is rejected
/// here, before any channel is consulted.
#[derive(Debug, Clone)]
pub struct NotificationRequest {
    destination: String,
    body: String,
}

impl NotificationRequest {
    pub fn new(destination: impl Into<String>, body: impl Into<String>) -> Result<Self, RequestError> {
        let destination = destination.into();
        let body = body.into();
        if destination.trim().is_empty() {
            return Err(RequestError::MissingDestination);
        }
        if body.trim().is_empty() {
            return Err(RequestError::MissingBody);
        }
        Ok(Self { destination, body })
    }

    /// Render a status transition into a request via the pure formatter.
    pub fn status_change(
        destination: impl Into<String>,
        change: &StatusChange,
    ) -> Result<Self, RequestError> {
        Self::new(destination, status_change_body(change))
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// One entry on the fallback chain of a single dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelAttempt {
    pub channel: String,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

/// Outcome of one dispatch. Produced exactly once per request, used for
/// diagnostics only — never persisted, never retried beyond the chain.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryResult {
    pub channel_used: String,
    pub succeeded: bool,
    pub attempts: Vec<ChannelAttempt>,
}

/// Operational snapshot of one channel, for dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelReport {
    pub channel: String,
    pub readiness: Readiness,
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_rejects_empty_destination() {
        let err = NotificationRequest::new("", "hello").unwrap_err();
        assert_eq!(err, RequestError::MissingDestination);
        assert_eq!(err.code(), "MALFORMED_REQUEST");
    }

    #[test]
    fn request_rejects_blank_body() {
        let err = NotificationRequest::new("+911234567890", "   ").unwrap_err();
        assert_eq!(err, RequestError::MissingBody);
    }

    #[test]
    fn well_formed_request_is_accepted() {
        let req = NotificationRequest::new("+911234567890", "hello").unwrap();
        assert_eq!(req.destination(), "+911234567890");
        assert_eq!(req.body(), "hello");
    }
}
