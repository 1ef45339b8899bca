use async_trait::async_trait;

use crate::{error::ChannelError, types::Readiness};

/// Common interface implemented by every outbound notification channel
/// (native messaging client, hosted API, recording sink).
///
/// Implementations must be `Send + Sync` so they can be shared between the
/// router and the background tasks that own their readiness flags. Any
/// adapter satisfying this two-method send contract can be inserted into
/// the router's priority list without touching router logic.
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Stable lowercase identifier recorded on fallback chains
    /// (`"native"`, `"hosted-api"`, `"recording"`).
    fn name(&self) -> &str;

    /// Last known readiness. Must not block or perform I/O — the flag is
    /// maintained by the channel's own initializer.
    fn readiness(&self) -> Readiness;

    /// Human-readable operational status for dashboards, e.g.
    /// "connected and ready", "waiting for pairing", "credentials invalid".
    fn readiness_detail(&self) -> String;

    /// Attempt exactly one delivery. Retries, if any, belong to the
    /// channel's own transport and are opaque to the router.
    async fn send(&self, destination: &str, body: &str) -> Result<(), ChannelError>;
}
