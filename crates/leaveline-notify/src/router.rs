use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{
    channel::NotifyChannel,
    error::ChannelError,
    redact::redact_destination,
    types::{ChannelAttempt, ChannelReport, DeliveryResult, NotificationRequest, Readiness},
};

/// Routes one notification across channels in fixed priority order.
///
/// Channels are tried sequentially (index 0 first) and the chain
/// short-circuits on the first successful send. Every channel-level error
/// is absorbed into the attempt record — nothing propagates to the
/// caller. With a recording sink registered last, `dispatch` cannot
/// return `succeeded = false`.
///
/// The router holds no per-request state and requires no locking; the
/// only shared state is each channel's readiness flag, owned by that
/// channel's initializer.
pub struct DeliveryRouter {
    channels: Vec<Arc<dyn NotifyChannel>>,
    send_timeout: Option<Duration>,
}

impl DeliveryRouter {
    /// Create a router with the given priority-ordered channels.
    /// At least one channel is required.
    pub fn new(channels: Vec<Arc<dyn NotifyChannel>>) -> Self {
        assert!(!channels.is_empty(), "DeliveryRouter requires at least one channel");
        Self {
            channels,
            send_timeout: Some(Duration::from_millis(leaveline_core::config::SEND_TIMEOUT_MS)),
        }
    }

    /// Override the per-channel send time budget. `None` lets a hung
    /// transport stall the chain indefinitely.
    pub fn with_send_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Deliver one request through the fallback chain.
    ///
    /// Exactly one send attempt per channel per dispatch. A channel that
    /// is not `Ready` still contributes a failed attempt to the chain so
    /// diagnostics show the full consultation order. Two dispatches of
    /// the same request produce two independent results — deduplication
    /// is the caller's concern.
    pub async fn dispatch(&self, request: &NotificationRequest) -> DeliveryResult {
        let redacted = redact_destination(request.destination());
        let mut attempts: Vec<ChannelAttempt> = Vec::with_capacity(self.channels.len());

        for channel in &self.channels {
            let name = channel.name().to_string();

            let readiness = channel.readiness();
            if readiness != Readiness::Ready {
                debug!(
                    channel = %name,
                    readiness = %readiness,
                    destination = %redacted,
                    "channel not ready, advancing fallback chain"
                );
                attempts.push(ChannelAttempt {
                    channel: name,
                    succeeded: false,
                    error_code: Some("NOT_READY".to_string()),
                });
                continue;
            }

            match self.attempt_send(channel.as_ref(), request).await {
                Ok(()) => {
                    info!(
                        channel = %name,
                        destination = %redacted,
                        fallbacks = attempts.len(),
                        "notification delivered"
                    );
                    attempts.push(ChannelAttempt {
                        channel: name.clone(),
                        succeeded: true,
                        error_code: None,
                    });
                    return DeliveryResult {
                        channel_used: name,
                        succeeded: true,
                        attempts,
                    };
                }
                Err(e) => {
                    warn!(
                        channel = %name,
                        destination = %redacted,
                        code = e.code(),
                        error = %e,
                        "channel send failed, advancing fallback chain"
                    );
                    attempts.push(ChannelAttempt {
                        channel: name,
                        succeeded: false,
                        error_code: Some(e.code().to_string()),
                    });
                }
            }
        }

        // Only reachable when no recording sink is registered last.
        warn!(destination = %redacted, "all channels failed, notification not delivered");
        DeliveryResult {
            channel_used: "none".to_string(),
            succeeded: false,
            attempts,
        }
    }

    async fn attempt_send(
        &self,
        channel: &dyn NotifyChannel,
        request: &NotificationRequest,
    ) -> Result<(), ChannelError> {
        match self.send_timeout {
            Some(budget) => {
                match tokio::time::timeout(budget, channel.send(request.destination(), request.body()))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ChannelError::Timeout {
                        ms: budget.as_millis() as u64,
                    }),
                }
            }
            None => channel.send(request.destination(), request.body()).await,
        }
    }

    /// Readiness snapshot of every channel, in priority order.
    pub fn statuses(&self) -> Vec<ChannelReport> {
        self.channels
            .iter()
            .map(|ch| ChannelReport {
                channel: ch.name().to_string(),
                readiness: ch.readiness(),
                detail: ch.readiness_detail(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Scripted channel for router tests.
    struct StubChannel {
        name: &'static str,
        readiness: Readiness,
        fail_with: Option<fn() -> ChannelError>,
        sends: AtomicU32,
    }

    impl StubChannel {
        fn ready_ok(name: &'static str) -> Self {
            Self {
                name,
                readiness: Readiness::Ready,
                fail_with: None,
                sends: AtomicU32::new(0),
            }
        }

        fn ready_failing(name: &'static str, err: fn() -> ChannelError) -> Self {
            Self {
                name,
                readiness: Readiness::Ready,
                fail_with: Some(err),
                sends: AtomicU32::new(0),
            }
        }

        fn not_ready(name: &'static str, readiness: Readiness) -> Self {
            Self {
                name,
                readiness,
                fail_with: None,
                sends: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl NotifyChannel for StubChannel {
        fn name(&self) -> &str {
            self.name
        }

        fn readiness(&self) -> Readiness {
            self.readiness
        }

        fn readiness_detail(&self) -> String {
            format!("stub ({})", self.readiness)
        }

        async fn send(&self, _destination: &str, _body: &str) -> Result<(), ChannelError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            match self.fail_with {
                Some(err) => Err(err()),
                None => Ok(()),
            }
        }
    }

    /// Never completes — used to exercise the timeout wrapper.
    struct HangingChannel;

    #[async_trait]
    impl NotifyChannel for HangingChannel {
        fn name(&self) -> &str {
            "native"
        }
        fn readiness(&self) -> Readiness {
            Readiness::Ready
        }
        fn readiness_detail(&self) -> String {
            "hanging".to_string()
        }
        async fn send(&self, _destination: &str, _body: &str) -> Result<(), ChannelError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    fn request() -> NotificationRequest {
        NotificationRequest::new("+919876543210", "your leave was approved").unwrap()
    }

    #[tokio::test]
    async fn first_ready_channel_short_circuits() {
        let native = Arc::new(StubChannel::ready_ok("native"));
        let hosted = Arc::new(StubChannel::ready_ok("hosted-api"));
        let router = DeliveryRouter::new(vec![native.clone(), hosted.clone()]);

        let result = router.dispatch(&request()).await;

        assert!(result.succeeded);
        assert_eq!(result.channel_used, "native");
        assert_eq!(result.attempts.len(), 1);
        assert_eq!(native.sends.load(Ordering::SeqCst), 1);
        assert_eq!(hosted.sends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unready_channels_are_recorded_not_sent() {
        let native = Arc::new(StubChannel::not_ready("native", Readiness::Uninitialized));
        let hosted = Arc::new(StubChannel::not_ready("hosted-api", Readiness::Unavailable));
        let recording = Arc::new(StubChannel::ready_ok("recording"));
        let router = DeliveryRouter::new(vec![native.clone(), hosted.clone(), recording]);

        let result = router.dispatch(&request()).await;

        assert!(result.succeeded);
        assert_eq!(result.channel_used, "recording");
        assert_eq!(result.attempts.len(), 3);
        assert_eq!(result.attempts[0].channel, "native");
        assert!(!result.attempts[0].succeeded);
        assert_eq!(result.attempts[1].channel, "hosted-api");
        assert!(!result.attempts[1].succeeded);
        assert!(result.attempts[2].succeeded);
        assert_eq!(native.sends.load(Ordering::SeqCst), 0);
        assert_eq!(hosted.sends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn degraded_channel_is_skipped_like_unavailable() {
        let native = Arc::new(StubChannel::not_ready("native", Readiness::Degraded));
        let recording = Arc::new(StubChannel::ready_ok("recording"));
        let router = DeliveryRouter::new(vec![native.clone(), recording]);

        let result = router.dispatch(&request()).await;

        assert!(result.succeeded);
        assert_eq!(result.channel_used, "recording");
        assert_eq!(result.attempts[0].error_code.as_deref(), Some("NOT_READY"));
        assert_eq!(native.sends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn hosted_ready_native_down_takes_two_attempts() {
        let native = Arc::new(StubChannel::not_ready("native", Readiness::Unavailable));
        let hosted = Arc::new(StubChannel::ready_ok("hosted-api"));
        let recording = Arc::new(StubChannel::ready_ok("recording"));
        let router = DeliveryRouter::new(vec![native, hosted, recording.clone()]);

        let result = router.dispatch(&request()).await;

        assert!(result.succeeded);
        assert_eq!(result.channel_used, "hosted-api");
        assert_eq!(result.attempts.len(), 2);
        assert!(result.attempts[1].succeeded);
        assert_eq!(recording.sends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn recipient_not_registered_falls_through() {
        let hosted = Arc::new(StubChannel::ready_failing("hosted-api", || {
            ChannelError::RecipientNotRegistered {
                destination: "+919876543210".to_string(),
            }
        }));
        let recording = Arc::new(StubChannel::ready_ok("recording"));
        let router = DeliveryRouter::new(vec![hosted, recording]);

        let result = router.dispatch(&request()).await;

        assert!(result.succeeded);
        assert_eq!(result.channel_used, "recording");
        assert_eq!(
            result.attempts[0].error_code.as_deref(),
            Some("RECIPIENT_NOT_REGISTERED")
        );
    }

    #[tokio::test]
    async fn transport_failure_advances_the_chain() {
        let native = Arc::new(StubChannel::ready_failing("native", || {
            ChannelError::Transport("connection reset".to_string())
        }));
        let hosted = Arc::new(StubChannel::ready_ok("hosted-api"));
        let router = DeliveryRouter::new(vec![native.clone(), hosted]);

        let result = router.dispatch(&request()).await;

        assert!(result.succeeded);
        assert_eq!(result.channel_used, "hosted-api");
        assert_eq!(result.attempts[0].error_code.as_deref(), Some("TRANSPORT_FAILURE"));
        // Exactly one attempt on the failing channel — no internal retry.
        assert_eq!(native.sends.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn hung_transport_times_out_and_falls_through() {
        let recording = Arc::new(StubChannel::ready_ok("recording"));
        let router = DeliveryRouter::new(vec![Arc::new(HangingChannel), recording])
            .with_send_timeout(Some(Duration::from_millis(50)));

        let result = router.dispatch(&request()).await;

        assert!(result.succeeded);
        assert_eq!(result.channel_used, "recording");
        assert_eq!(result.attempts[0].error_code.as_deref(), Some("TIMEOUT"));
    }

    #[tokio::test]
    async fn repeated_dispatch_produces_independent_results() {
        let native = Arc::new(StubChannel::ready_ok("native"));
        let router = DeliveryRouter::new(vec![native.clone()]);
        let req = request();

        let first = router.dispatch(&req).await;
        let second = router.dispatch(&req).await;

        assert!(first.succeeded && second.succeeded);
        // No deduplication: both dispatches really sent.
        assert_eq!(native.sends.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn all_channels_failing_reports_no_channel() {
        let native = Arc::new(StubChannel::ready_failing("native", || {
            ChannelError::SendFailed("boom".to_string())
        }));
        let router = DeliveryRouter::new(vec![native]);

        let result = router.dispatch(&request()).await;

        assert!(!result.succeeded);
        assert_eq!(result.channel_used, "none");
        assert_eq!(result.attempts.len(), 1);
    }

    #[test]
    fn statuses_follow_priority_order() {
        let router = DeliveryRouter::new(vec![
            Arc::new(StubChannel::not_ready("native", Readiness::Uninitialized)),
            Arc::new(StubChannel::ready_ok("hosted-api")),
            Arc::new(StubChannel::ready_ok("recording")),
        ]);

        let reports = router.statuses();
        let names: Vec<&str> = reports.iter().map(|r| r.channel.as_str()).collect();
        assert_eq!(names, vec!["native", "hosted-api", "recording"]);
        assert_eq!(reports[0].readiness, Readiness::Uninitialized);
    }
}
