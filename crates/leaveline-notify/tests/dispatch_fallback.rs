//! End-to-end fallback behavior with the real channel adapters
//! (no network: native unpaired, hosted unconfigured).

use std::sync::Arc;

use chrono::NaiveDate;
use leaveline_core::types::{Decision, LeaveType};
use leaveline_notify::{
    DeliveryRouter, HostedApiChannel, NativeChannel, NotificationRequest, RecordingChannel,
    StatusChange, UnpairedSession,
};

fn approved_change() -> StatusChange {
    StatusChange {
        applicant_name: "Asha Rao".to_string(),
        leave_type: LeaveType::Sick,
        date_start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        date_end: NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
        status: Decision::Approved,
        reviewer_name: "Dr. Menon".to_string(),
        comments: "Get well soon".to_string(),
    }
}

#[tokio::test]
async fn unconfigured_deployment_falls_through_to_recording() {
    let recording = Arc::new(RecordingChannel::new());
    let router = DeliveryRouter::new(vec![
        Arc::new(NativeChannel::new(Arc::new(UnpairedSession))),
        Arc::new(HostedApiChannel::new(None)),
        recording.clone(),
    ]);

    let request =
        NotificationRequest::status_change("+919876543210", &approved_change()).unwrap();
    let result = router.dispatch(&request).await;

    // Full chain for an unconfigured deployment: native fails
    // (unpaired), hosted-api fails (no credentials), recording
    // succeeds.
    assert!(result.succeeded);
    assert_eq!(result.channel_used, "recording");
    assert_eq!(result.attempts.len(), 3);
    assert_eq!(result.attempts[0].channel, "native");
    assert!(!result.attempts[0].succeeded);
    assert_eq!(result.attempts[1].channel, "hosted-api");
    assert!(!result.attempts[1].succeeded);
    assert_eq!(result.attempts[2].channel, "recording");
    assert!(result.attempts[2].succeeded);

    // The recorded body carries the fully rendered message.
    let records = recording.recent();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].destination, "+919876543210");
    for needle in ["Asha Rao", "sick", "2024-03-01", "2024-03-03", "approved", "Dr. Menon"] {
        assert!(records[0].body.contains(needle), "missing {needle:?}");
    }
}

#[tokio::test]
async fn readiness_reports_match_deployment_state() {
    let router = DeliveryRouter::new(vec![
        Arc::new(NativeChannel::new(Arc::new(UnpairedSession))),
        Arc::new(HostedApiChannel::new(None)),
        Arc::new(RecordingChannel::new()),
    ]);

    let reports = router.statuses();
    assert_eq!(reports[0].detail, "waiting for pairing");
    assert_eq!(reports[1].detail, "credentials not configured");
    assert_eq!(reports[2].detail, "recording to local log");
}

#[tokio::test]
async fn malformed_request_is_rejected_before_any_channel() {
    let err = NotificationRequest::status_change("", &approved_change()).unwrap_err();
    assert_eq!(err.code(), "MALFORMED_REQUEST");
}
