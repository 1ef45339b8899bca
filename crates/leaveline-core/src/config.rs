use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 18890;
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Heartbeat tick cadence on push connections.
pub const HEARTBEAT_INTERVAL_SECS: u64 = 30;
/// Fixed interval between native-session supervision checks (no backoff growth).
pub const SESSION_RETRY_SECS: u64 = 10;
/// Default wall-clock budget for a single channel send attempt.
pub const SEND_TIMEOUT_MS: u64 = 15_000;

/// Top-level config (leaveline.toml + LEAVELINE_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeavelineConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Default for LeavelineConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            database: DatabaseConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Outbound notification subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifyConfig {
    /// Hosted messaging API tier. Absent credentials leave the hosted
    /// channel permanently unavailable (the recording sink still catches
    /// every message).
    pub hosted: Option<HostedApiConfig>,
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    #[serde(default = "default_session_retry_secs")]
    pub session_retry_secs: u64,
}

/// Credentials for the hosted messaging API (Twilio-compatible surface).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedApiConfig {
    /// Account identifier (e.g. an SID).
    pub account_id: String,
    /// Account secret. Never logged; diagnostics are redacted.
    pub auth_token: String,
    /// Sender address, E.164 (e.g. "+14155238886").
    pub sender: String,
    #[serde(default = "default_hosted_base_url")]
    pub base_url: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.leaveline/leaveline.db", home)
}
fn default_hosted_base_url() -> String {
    "https://api.twilio.com".to_string()
}
fn default_send_timeout_ms() -> u64 {
    SEND_TIMEOUT_MS
}
fn default_session_retry_secs() -> u64 {
    SESSION_RETRY_SECS
}

impl LeavelineConfig {
    /// Load config from a TOML file with LEAVELINE_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.leaveline/leaveline.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: LeavelineConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("LEAVELINE_").split("_"))
            .extract()
            .map_err(|e| crate::error::LeavelineError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.leaveline/leaveline.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_hosted_tier() {
        let config = LeavelineConfig::default();
        assert!(config.notify.hosted.is_none());
        assert_eq!(config.gateway.port, DEFAULT_PORT);
    }

    #[test]
    fn hosted_config_fills_base_url_default() {
        let toml = r#"
            [notify.hosted]
            account_id = "AC123"
            auth_token = "secret"
            sender = "+14155238886"
        "#;
        let config: LeavelineConfig = Figment::new()
            .merge(Toml::string(toml))
            .extract()
            .unwrap();
        let hosted = config.notify.hosted.unwrap();
        assert_eq!(hosted.base_url, "https://api.twilio.com");
        assert_eq!(hosted.account_id, "AC123");
    }
}
