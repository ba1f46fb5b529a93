use std::time::Duration;

use anyhow::ensure;
use serde::Deserialize;

use talaro_core::config::Config;

use crate::domain::types::{DEFAULT_CODE_TTL_SECS, DEFAULT_MAX_ATTEMPTS, ResetPolicy};

/// Recovery service configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct RecoveryConfig {
    /// PostgreSQL connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// TCP port to listen on (default 3114). Env var: `RECOVERY_PORT`.
    #[serde(default = "default_port")]
    pub recovery_port: u16,
    /// Reset code lifetime in seconds (default 900). Env var: `OTP_TTL_SECS`.
    #[serde(default = "default_ttl_secs")]
    pub otp_ttl_secs: i64,
    /// Failed verifications allowed per code (default 5). Env var: `OTP_MAX_ATTEMPTS`.
    #[serde(default = "default_max_attempts")]
    pub otp_max_attempts: i32,
    /// Budget for the primary delivery channel before falling back.
    #[serde(default = "default_delivery_timeout_ms")]
    pub delivery_timeout_ms: u64,
    /// Product name used in email subjects and signatures.
    #[serde(default = "default_product_name")]
    pub product_name: String,
}

impl Config for RecoveryConfig {}

impl RecoveryConfig {
    pub fn policy(&self) -> anyhow::Result<ResetPolicy> {
        ensure!(
            self.otp_ttl_secs > 0,
            "OTP_TTL_SECS must be positive, got {}",
            self.otp_ttl_secs
        );
        ensure!(
            self.otp_max_attempts > 0,
            "OTP_MAX_ATTEMPTS must be positive, got {}",
            self.otp_max_attempts
        );
        Ok(ResetPolicy {
            code_ttl: chrono::Duration::seconds(self.otp_ttl_secs),
            max_attempts: self.otp_max_attempts,
        })
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }
}

fn default_port() -> u16 {
    3114
}

fn default_ttl_secs() -> i64 {
    DEFAULT_CODE_TTL_SECS
}

fn default_max_attempts() -> i32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_delivery_timeout_ms() -> u64 {
    5_000
}

fn default_product_name() -> String {
    "Talaro".to_owned()
}
