#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::message::OutboundMessage;
use crate::domain::types::{ActionLogEntry, Attempt, Identity, ResetCode, ResetPolicy};
use crate::error::RecoveryError;

/// Port onto the account directory owned by the surrounding application.
pub trait IdentityDirectory: Send + Sync {
    /// Case-insensitive lookup; `email` is already normalized.
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, RecoveryError>;

    /// Replace the identity's credential. Hashing is the directory's concern.
    async fn set_credential(&self, identity: &Identity, new_secret: &str)
    -> Result<(), RecoveryError>;
}

/// Durable store for reset codes. Every method is atomic.
pub trait ResetCodeRepository: Send + Sync {
    /// Insert `code` and finalize every other unused code with the same owner and
    /// address, in one transaction. Returns how many codes were superseded.
    async fn issue(&self, code: &ResetCode) -> Result<u64, RecoveryError>;

    /// Run one verification attempt under a row lock:
    ///
    /// 1. Select the newest unused code for `owner` + `address` carrying `presented`.
    /// 2. If found, lock it, apply [`ResetCode::verify`], persist. On
    ///    [`Verdict::Accepted`](crate::domain::types::Verdict::Accepted) finalize
    ///    every unused sibling for the same owner + address.
    /// 3. Otherwise lock the newest unused code for `owner` + `address` and apply
    ///    [`ResetCode::charge_mismatch`].
    async fn attempt(
        &self,
        owner: Uuid,
        address: &str,
        presented: &str,
        now: DateTime<Utc>,
        policy: &ResetPolicy,
    ) -> Result<Attempt, RecoveryError>;
}

/// Delivery channel failure. Never surfaced to callers of the recovery operations.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("{channel} delivery failed: {source}")]
    Channel {
        channel: &'static str,
        source: anyhow::Error,
    },
    #[error("{channel} delivery timed out")]
    Timeout { channel: &'static str },
    #[error("all delivery channels failed (primary: {primary}; fallback: {fallback})")]
    Exhausted {
        primary: Box<DeliveryError>,
        fallback: Box<DeliveryError>,
    },
}

/// Outbound message delivery.
pub trait NotificationSender: Send + Sync {
    fn channel(&self) -> &'static str;

    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError>;
}

/// Audit trail sink.
pub trait ActionLog: Send + Sync {
    async fn record(&self, entry: &ActionLogEntry) -> Result<(), RecoveryError>;
}
