//! Thin REST glue over the store and the notification router.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use leaveline_core::types::{Decision, LeaveStatus};
use leaveline_notify::{NotificationRequest, StatusChange};
use leaveline_store::{LeaveApplication, NewApplication, StoreError};

use crate::app::AppState;
use crate::ws::PushEvent;

/// API-facing error: status code plus a short machine code.
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match &e {
            StoreError::NotFound { .. } => {
                ApiError::new(StatusCode::NOT_FOUND, "APPLICATION_NOT_FOUND", e.to_string())
            }
            StoreError::InvalidTransition { .. } => {
                ApiError::new(StatusCode::CONFLICT, "INVALID_TRANSITION", e.to_string())
            }
            StoreError::Database(_) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                e.to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.code, "message": self.message }));
        (self.status, body).into_response()
    }
}

/// GET /health — liveness probe, returns server metadata.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "ws_clients": state.ws_clients.len(),
        "hosted_api_configured": state.config.notify.hosted.is_some(),
    }))
}

/// GET /api/channels — per-channel readiness for operational dashboards.
pub async fn channel_statuses(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.notifier.statuses())
}

/// GET /api/notifications/recorded — messages that fell through to the
/// recording sink.
pub async fn recorded_notifications(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.recording.recent())
}

/// POST /api/applications — submit a new leave request.
pub async fn submit_application(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewApplication>,
) -> Result<impl IntoResponse, ApiError> {
    let application = state.store.create(new)?;

    state.broadcaster.send(PushEvent::ApplicationSubmitted {
        application_id: application.id.clone(),
        applicant_name: application.applicant_name.clone(),
        leave_type: application.leave_type.to_string(),
    });

    Ok((StatusCode::CREATED, Json(application)))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    status: Option<String>,
}

/// GET /api/applications[?status=pending] — newest first.
pub async fn list_applications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<LeaveApplication>>, ApiError> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(LeaveStatus::from_str(raw).map_err(|e| {
            ApiError::new(StatusCode::BAD_REQUEST, "INVALID_STATUS", e)
        })?),
        None => None,
    };
    Ok(Json(state.store.list(status)?))
}

#[derive(Debug, Deserialize)]
pub struct DecideRequest {
    pub decision: Decision,
    pub reviewer_name: String,
    pub comments: Option<String>,
}

/// POST /api/applications/{id}/decision — approve or reject.
///
/// The status transition is the authoritative outcome; the outbound
/// notification is dispatched on a detached task so its failure can
/// never roll back or delay the decision.
pub async fn decide_application(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<DecideRequest>,
) -> Result<Json<LeaveApplication>, ApiError> {
    let decided = state
        .store
        .decide(&id, req.decision, &req.reviewer_name, req.comments.as_deref())?;

    state.broadcaster.send(PushEvent::StatusChanged {
        application_id: decided.id.clone(),
        applicant_phone: decided.applicant_phone.clone(),
        status: decided.status.to_string(),
        reviewer_name: req.reviewer_name.clone(),
    });

    let change = StatusChange {
        applicant_name: decided.applicant_name.clone(),
        leave_type: decided.leave_type.clone(),
        date_start: decided.date_start,
        date_end: decided.date_end,
        status: req.decision,
        reviewer_name: req.reviewer_name,
        comments: decided.comments.clone().unwrap_or_default(),
    };

    match NotificationRequest::status_change(&decided.applicant_phone, &change) {
        Ok(request) => {
            let state = Arc::clone(&state);
            let application_id = decided.id.clone();
            tokio::spawn(async move {
                let result = state.notifier.dispatch(&request).await;
                debug!(
                    application = %application_id,
                    channel = %result.channel_used,
                    attempts = result.attempts.len(),
                    "status notification dispatched"
                );
            });
        }
        Err(e) => {
            // Malformed request is the one caller-visible notification
            // error; here the workflow carries on regardless.
            warn!(application = %decided.id, error = %e, "skipping notification");
        }
    }

    Ok(Json(decided))
}
