use uuid::Uuid;

use crate::domain::types::{Identity, ResetCode, ResetPolicy};

/// Rendered email ready for a delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    /// Stable per logical message; lets durable channels deduplicate.
    pub idempotency_key: String,
}

pub fn reset_code_message(
    product: &str,
    identity: &Identity,
    code: &ResetCode,
    policy: &ResetPolicy,
) -> OutboundMessage {
    let body = format!(
        "Hello {name},\n\
         \n\
         You requested a password reset for your {product} account.\n\
         \n\
         Your OTP code is: {code}\n\
         \n\
         This OTP will expire in {minutes} minutes.\n\
         \n\
         If you didn't request this password reset, please ignore this email or contact support.\n\
         \n\
         Best regards,\n\
         {product} Team\n\
         \n\
         ---\n\
         This is an automated message. Please do not reply to this email.\n",
        name = identity.display_name(),
        code = code.code,
        minutes = policy.ttl_minutes(),
    );
    OutboundMessage {
        to: identity.email.clone(),
        subject: format!("Password Reset OTP - {product}"),
        body,
        idempotency_key: format!("password_reset_code:{}", code.id),
    }
}

pub fn reset_confirmation_message(
    product: &str,
    identity: &Identity,
    code_id: Uuid,
) -> OutboundMessage {
    let body = format!(
        "Hello {name},\n\
         \n\
         Your password has been successfully reset.\n\
         \n\
         If you didn't make this change, please contact our support team immediately.\n\
         \n\
         Best regards,\n\
         {product} Team\n\
         \n\
         ---\n\
         This is an automated message. Please do not reply to this email.\n",
        name = identity.display_name(),
    );
    OutboundMessage {
        to: identity.email.clone(),
        subject: format!("Password Reset Successful - {product}"),
        body,
        idempotency_key: format!("password_reset_confirmed:{code_id}"),
    }
}
