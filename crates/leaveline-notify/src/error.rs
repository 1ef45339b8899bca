use thiserror::Error;

/// Errors that can occur inside any notification channel adapter.
///
/// These never escape the router: every variant becomes an attempt record
/// on the fallback chain and the next channel is tried.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel-specific configuration is absent.
    #[error("Channel configuration missing: {0}")]
    ConfigMissing(String),

    /// The provider rejected the configured credentials.
    #[error("Authentication rejected: {0}")]
    AuthRejected(String),

    /// Trial/sandbox tier of the hosted API — the recipient has not opted in.
    #[error("Recipient not registered with provider sandbox: {destination}")]
    RecipientNotRegistered { destination: String },

    /// Network-level failure talking to the provider.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The provider accepted the request but refused to deliver.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// A send attempt exceeded the router's per-channel time budget.
    #[error("Send timed out after {ms}ms")]
    Timeout { ms: u64 },
}

impl ChannelError {
    /// Short code string recorded on the fallback chain.
    pub fn code(&self) -> &'static str {
        match self {
            ChannelError::ConfigMissing(_) => "CONFIG_MISSING",
            ChannelError::AuthRejected(_) => "AUTH_REJECTED",
            ChannelError::RecipientNotRegistered { .. } => "RECIPIENT_NOT_REGISTERED",
            ChannelError::Transport(_) => "TRANSPORT_FAILURE",
            ChannelError::SendFailed(_) => "SEND_FAILED",
            ChannelError::Timeout { .. } => "TIMEOUT",
        }
    }
}

impl From<reqwest::Error> for ChannelError {
    fn from(e: reqwest::Error) -> Self {
        ChannelError::Transport(e.to_string())
    }
}

/// The only error visible to callers of the notification subsystem:
/// a request that cannot be constructed is rejected before any channel
/// is tried. Notification delivery failures never reach the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("notification request has no destination")]
    MissingDestination,

    #[error("notification request has no body")]
    MissingBody,
}

impl RequestError {
    pub fn code(&self) -> &'static str {
        "MALFORMED_REQUEST"
    }
}
