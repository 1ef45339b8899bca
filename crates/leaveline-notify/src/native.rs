//! Native messaging-client channel.
//!
//! The actual client (a persistent, pairing-based messaging session — in
//! production a browser-automation integration) lives outside this crate
//! behind the [`MessagingSession`] trait. This adapter only tracks the
//! session's pairing state and forwards sends.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{channel::NotifyChannel, error::ChannelError, types::Readiness};

/// Opaque handle to an external messaging session that requires an
/// out-of-band pairing step (scanning a login code) before it can send.
///
/// `paired()` is a plain flag read — the session owns the flag and flips
/// it whenever the handshake completes or the session is lost.
#[async_trait]
pub trait MessagingSession: Send + Sync {
    /// True once the pairing handshake has completed.
    fn paired(&self) -> bool;

    /// Begin (or re-begin) establishing the session. Pairing itself
    /// completes out-of-band; this only kicks off the attempt.
    async fn establish(&self) -> Result<(), ChannelError>;

    /// Deliver one message over the paired session.
    async fn deliver(&self, destination: &str, body: &str) -> Result<(), ChannelError>;
}

/// Placeholder session used when no native client integration is wired
/// in. Never pairs; the channel stays in the waiting-for-pairing state
/// and every dispatch falls through to the next channel.
pub struct UnpairedSession;

#[async_trait]
impl MessagingSession for UnpairedSession {
    fn paired(&self) -> bool {
        false
    }

    async fn establish(&self) -> Result<(), ChannelError> {
        // Nothing to establish; the channel just stays unpaired.
        Ok(())
    }

    async fn deliver(&self, _destination: &str, _body: &str) -> Result<(), ChannelError> {
        Err(ChannelError::SendFailed("session not paired".to_string()))
    }
}

/// Highest-priority channel: no per-message cost, no third-party account,
/// but only usable after pairing — and the session can silently drop.
pub struct NativeChannel {
    session: Arc<dyn MessagingSession>,
}

impl NativeChannel {
    pub fn new(session: Arc<dyn MessagingSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl NotifyChannel for NativeChannel {
    fn name(&self) -> &str {
        "native"
    }

    fn readiness(&self) -> Readiness {
        if self.session.paired() {
            Readiness::Ready
        } else {
            Readiness::Uninitialized
        }
    }

    fn readiness_detail(&self) -> String {
        if self.session.paired() {
            "connected and ready".to_string()
        } else {
            "waiting for pairing".to_string()
        }
    }

    async fn send(&self, destination: &str, body: &str) -> Result<(), ChannelError> {
        if !self.session.paired() {
            return Err(ChannelError::SendFailed("session not paired".to_string()));
        }
        self.session.deliver(destination, body).await
    }
}

/// Keep a session alive for the lifetime of the process.
///
/// Checks the pairing flag at a fixed interval and re-kicks `establish`
/// whenever the session is down. The interval never grows — a lost
/// session is retried at the same cadence indefinitely.
pub async fn supervise(session: Arc<dyn MessagingSession>, interval: Duration) {
    let mut was_paired = false;

    loop {
        let paired = session.paired();
        match (was_paired, paired) {
            (false, true) => info!("native session paired"),
            (true, false) => warn!("native session lost, waiting for re-pairing"),
            _ => {}
        }
        was_paired = paired;

        if !paired {
            if let Err(e) = session.establish().await {
                warn!(error = %e, "native session establish failed");
            }
        }

        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FlagSession {
        paired: AtomicBool,
    }

    #[async_trait]
    impl MessagingSession for FlagSession {
        fn paired(&self) -> bool {
            self.paired.load(Ordering::SeqCst)
        }
        async fn establish(&self) -> Result<(), ChannelError> {
            Ok(())
        }
        async fn deliver(&self, _destination: &str, _body: &str) -> Result<(), ChannelError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn readiness_follows_pairing_flag() {
        let session = Arc::new(FlagSession {
            paired: AtomicBool::new(false),
        });
        let channel = NativeChannel::new(session.clone());

        assert_eq!(channel.readiness(), Readiness::Uninitialized);
        assert_eq!(channel.readiness_detail(), "waiting for pairing");

        session.paired.store(true, Ordering::SeqCst);
        assert_eq!(channel.readiness(), Readiness::Ready);
        assert_eq!(channel.readiness_detail(), "connected and ready");
    }

    #[tokio::test]
    async fn unpaired_send_fails_without_touching_session() {
        let channel = NativeChannel::new(Arc::new(UnpairedSession));
        let err = channel.send("+911234567890", "hello").await.unwrap_err();
        assert_eq!(err.code(), "SEND_FAILED");
    }
}
