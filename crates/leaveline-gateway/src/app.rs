use axum::{
    routing::{get, post},
    Router,
};
use dashmap::DashMap;
use std::sync::Arc;

use leaveline_core::config::LeavelineConfig;
use leaveline_notify::{DeliveryRouter, RecordingChannel};
use leaveline_store::LeaveStore;

use crate::ws::EventBroadcaster;

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: LeavelineConfig,
    pub store: LeaveStore,
    pub notifier: DeliveryRouter,
    /// Kept separately so the ops endpoint can expose undelivered messages.
    pub recording: Arc<RecordingChannel>,
    pub broadcaster: EventBroadcaster,
    /// Active push connections: conn_id -> user filter ("" = unfiltered).
    pub ws_clients: DashMap<String, String>,
}

impl AppState {
    pub fn new(
        config: LeavelineConfig,
        store: LeaveStore,
        notifier: DeliveryRouter,
        recording: Arc<RecordingChannel>,
    ) -> Self {
        Self {
            config,
            store,
            notifier,
            recording,
            broadcaster: EventBroadcaster::new(),
            ws_clients: DashMap::new(),
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health_handler))
        .route("/ws", get(crate::ws::ws_handler))
        .route("/api/channels", get(crate::http::channel_statuses))
        .route("/api/notifications/recorded", get(crate::http::recorded_notifications))
        .route(
            "/api/applications",
            get(crate::http::list_applications).post(crate::http::submit_application),
        )
        .route(
            "/api/applications/{id}/decision",
            post(crate::http::decide_application),
        )
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
