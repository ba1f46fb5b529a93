use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Number of digits in a reset code.
pub const CODE_LEN: usize = 6;

/// Minimum accepted length (in characters) for a new password.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Default reset-code lifetime in seconds (15 minutes).
pub const DEFAULT_CODE_TTL_SECS: i64 = 15 * 60;

/// Default failed-verification budget per code.
pub const DEFAULT_MAX_ATTEMPTS: i32 = 5;

/// Account the code authorizes a credential change on, as seen through the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
}

impl Identity {
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

/// Issuance and verification limits, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetPolicy {
    pub code_ttl: Duration,
    pub max_attempts: i32,
}

impl ResetPolicy {
    /// Lifetime in whole minutes, rounded up.
    pub fn ttl_minutes(&self) -> i64 {
        (self.code_ttl.num_seconds() + 59) / 60
    }
}

impl Default for ResetPolicy {
    fn default() -> Self {
        Self {
            code_ttl: Duration::seconds(DEFAULT_CODE_TTL_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Outcome of presenting digits against stored codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Code was valid and is now consumed.
    Accepted,
    /// Code was finalized by a concurrent attempt between lookup and lock.
    AlreadyUsed,
    /// Code matched but is past `expires_at`; one attempt was charged.
    Expired,
    /// Attempt budget is spent; code is now finalized.
    Exhausted,
    /// No unused code carries these digits.
    Rejected,
}

/// Why a code left the `ISSUED` state. Externally all three look like `used = true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Consumed,
    Exhausted,
    Superseded,
}

impl Termination {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Consumed => "consumed",
            Self::Exhausted => "exhausted",
            Self::Superseded => "superseded",
        }
    }
}

/// Result of one verification attempt as applied by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub verdict: Verdict,
    /// Code the attempt was charged to, if any.
    pub code_id: Option<Uuid>,
    pub attempts: i32,
    /// Sibling codes finalized alongside an accepted code.
    pub superseded: u64,
}

impl Attempt {
    pub fn unmatched() -> Self {
        Self {
            verdict: Verdict::Rejected,
            code_id: None,
            attempts: 0,
            superseded: 0,
        }
    }
}

/// Single-use password reset code.
///
/// Only `used` and `attempts` change after creation; `used` never goes back to
/// `false` and `attempts` never decreases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetCode {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Address the code was delivered to, pinned at issuance.
    pub email: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub attempts: i32,
}

impl ResetCode {
    pub fn issue(identity: &Identity, code: String, now: DateTime<Utc>, policy: &ResetPolicy) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id: identity.id,
            email: normalize_email(&identity.email),
            code,
            created_at: now,
            expires_at: now + policy.code_ttl,
            used: false,
            attempts: 0,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Evaluate a presentation of this code's own digits. Checks run in order:
    /// used, expired, budget. Mutates `self`; the caller persists it.
    pub fn verify(&mut self, now: DateTime<Utc>, policy: &ResetPolicy) -> Verdict {
        if self.used {
            // Race loser: record is already final, nothing is charged.
            return Verdict::AlreadyUsed;
        }
        if self.is_expired(now) {
            self.attempts += 1;
            return Verdict::Expired;
        }
        if self.attempts >= policy.max_attempts {
            self.used = true;
            return Verdict::Exhausted;
        }
        self.used = true;
        Verdict::Accepted
    }

    /// Charge a wrong-digits attempt to this outstanding code. Expired or
    /// finalized codes are not charged.
    pub fn charge_mismatch(&mut self, now: DateTime<Utc>, policy: &ResetPolicy) -> Verdict {
        if self.used || self.is_expired(now) {
            return Verdict::Rejected;
        }
        self.attempts += 1;
        if self.attempts >= policy.max_attempts {
            self.used = true;
            return Verdict::Exhausted;
        }
        Verdict::Rejected
    }
}

/// Trim and lowercase user-supplied email input.
pub fn normalize_email(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Request-origin details recorded in the audit trail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    Success,
    Failed,
}

impl ActionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

pub const ACTION_RESET_REQUEST: &str = "password_reset_request";
pub const ACTION_RESET: &str = "password_reset";

/// One audit-trail row.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionLogEntry {
    pub user_id: Option<Uuid>,
    pub action: &'static str,
    pub status: ActionStatus,
    pub details: serde_json::Value,
}
