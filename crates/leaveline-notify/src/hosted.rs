//! Hosted messaging API channel (Twilio-compatible REST surface).
//!
//! Credentials are validated exactly once, at process start. A failed
//! validation parks the channel as unavailable for the process lifetime —
//! there is no automatic re-validation.

use std::sync::atomic::{AtomicU8, Ordering};

use serde::Deserialize;
use tracing::{debug, info, warn};

use leaveline_core::config::HostedApiConfig;

use crate::{channel::NotifyChannel, error::ChannelError, types::Readiness};

/// Provider error code returned on trial tiers when the recipient has not
/// opted in to the sandbox sender.
const CODE_RECIPIENT_NOT_REGISTERED: i64 = 21608;

// Channel lifecycle states, stored in a single atomic. Written only by
// the startup validation; read by the router on every dispatch.
const STATE_UNVALIDATED: u8 = 0;
const STATE_READY: u8 = 1;
const STATE_NO_CREDENTIALS: u8 = 2;
const STATE_REJECTED: u8 = 3;
const STATE_UNREACHABLE: u8 = 4;

/// Second-priority channel: paid hosted messaging API.
pub struct HostedApiChannel {
    client: reqwest::Client,
    config: Option<HostedApiConfig>,
    state: AtomicU8,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    code: Option<i64>,
    message: Option<String>,
}

impl HostedApiChannel {
    /// Build the channel. Missing credentials are reported once here and
    /// leave the channel permanently unavailable.
    pub fn new(config: Option<HostedApiConfig>) -> Self {
        let state = match &config {
            Some(_) => STATE_UNVALIDATED,
            None => {
                info!("hosted-api credentials not configured, channel unavailable");
                STATE_NO_CREDENTIALS
            }
        };
        Self {
            client: reqwest::Client::new(),
            config,
            state: AtomicU8::new(state),
        }
    }

    /// Validate credentials against the provider. Called once at startup;
    /// the outcome is final for the process lifetime.
    pub async fn validate_credentials(&self) {
        let Some(config) = &self.config else {
            return;
        };

        let url = format!(
            "{}/2010-04-01/Accounts/{}.json",
            config.base_url, config.account_id
        );

        let response = self
            .client
            .get(&url)
            .basic_auth(&config.account_id, Some(&config.auth_token))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!(account = %redact_account(&config.account_id), "hosted-api credentials validated");
                self.state.store(STATE_READY, Ordering::SeqCst);
            }
            Ok(resp) => {
                // Redacted diagnostic — never log the token or the raw body.
                warn!(
                    account = %redact_account(&config.account_id),
                    status = resp.status().as_u16(),
                    "hosted-api credentials rejected, channel unavailable"
                );
                self.state.store(STATE_REJECTED, Ordering::SeqCst);
            }
            Err(e) => {
                warn!(error = %e, "hosted-api credential validation unreachable, channel unavailable");
                self.state.store(STATE_UNREACHABLE, Ordering::SeqCst);
            }
        }
    }
}

#[async_trait::async_trait]
impl NotifyChannel for HostedApiChannel {
    fn name(&self) -> &str {
        "hosted-api"
    }

    fn readiness(&self) -> Readiness {
        match self.state.load(Ordering::SeqCst) {
            STATE_READY => Readiness::Ready,
            STATE_UNVALIDATED => Readiness::Uninitialized,
            _ => Readiness::Unavailable,
        }
    }

    fn readiness_detail(&self) -> String {
        match self.state.load(Ordering::SeqCst) {
            STATE_READY => "credentials validated and ready".to_string(),
            STATE_UNVALIDATED => "credential validation pending".to_string(),
            STATE_NO_CREDENTIALS => "credentials not configured".to_string(),
            STATE_REJECTED => "credentials invalid".to_string(),
            _ => "credential validation failed".to_string(),
        }
    }

    async fn send(&self, destination: &str, body: &str) -> Result<(), ChannelError> {
        let Some(config) = &self.config else {
            return Err(ChannelError::ConfigMissing(
                "hosted-api credentials not configured".to_string(),
            ));
        };

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            config.base_url, config.account_id
        );

        debug!(destination = %crate::redact::redact_destination(destination), "hosted-api send");

        let resp = self
            .client
            .post(&url)
            .basic_auth(&config.account_id, Some(&config.auth_token))
            .form(&[
                ("From", format!("whatsapp:{}", config.sender)),
                ("To", format!("whatsapp:{}", destination)),
                ("Body", body.to_string()),
            ])
            .send()
            .await?;

        let status = resp.status().as_u16();
        if resp.status().is_success() {
            return Ok(());
        }

        if status == 401 || status == 403 {
            return Err(ChannelError::AuthRejected(format!(
                "provider returned HTTP {status}"
            )));
        }

        let error_body: ProviderErrorBody = resp.json().await.unwrap_or(ProviderErrorBody {
            code: None,
            message: None,
        });

        if error_body.code == Some(CODE_RECIPIENT_NOT_REGISTERED) {
            return Err(ChannelError::RecipientNotRegistered {
                destination: destination.to_string(),
            });
        }

        Err(ChannelError::SendFailed(format!(
            "HTTP {status}: {}",
            error_body.message.unwrap_or_else(|| "no detail".to_string())
        )))
    }
}

/// Keep only the first four characters of an account identifier in logs.
fn redact_account(account_id: &str) -> String {
    let visible: String = account_id.chars().take(4).collect();
    format!("{visible}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_park_the_channel() {
        let channel = HostedApiChannel::new(None);
        assert_eq!(channel.readiness(), Readiness::Unavailable);
        assert_eq!(channel.readiness_detail(), "credentials not configured");
    }

    #[test]
    fn configured_channel_starts_unvalidated() {
        let channel = HostedApiChannel::new(Some(HostedApiConfig {
            account_id: "AC0123456789".to_string(),
            auth_token: "secret".to_string(),
            sender: "+14155238886".to_string(),
            base_url: "https://api.twilio.com".to_string(),
        }));
        assert_eq!(channel.readiness(), Readiness::Uninitialized);
        assert_eq!(channel.readiness_detail(), "credential validation pending");
    }

    #[tokio::test]
    async fn send_without_credentials_is_config_missing() {
        let channel = HostedApiChannel::new(None);
        let err = channel.send("+911234567890", "hello").await.unwrap_err();
        assert_eq!(err.code(), "CONFIG_MISSING");
    }

    #[test]
    fn account_redaction_keeps_prefix_only() {
        assert_eq!(redact_account("AC0123456789"), "AC01…");
    }
}
