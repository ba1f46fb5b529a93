use anyhow::Context as _;
use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::message::reset_confirmation_message;
use crate::domain::repository::{
    ActionLog, IdentityDirectory, NotificationSender, ResetCodeRepository,
};
use crate::domain::types::{
    ACTION_RESET, ActionLogEntry, ActionStatus, Identity, MIN_PASSWORD_LEN, RequestMeta,
    ResetPolicy, Termination, Verdict, normalize_email,
};
use crate::error::{CredentialFailure, RecoveryError, ValidationFailure};
use crate::usecase::{audit_details, record_action};

pub struct ConfirmResetInput {
    pub email: String,
    pub code: String,
    pub new_password: String,
    pub meta: RequestMeta,
}

/// Verifies a reset code and applies the new credential.
pub struct ConfirmResetUseCase<U, R, N, L>
where
    U: IdentityDirectory,
    R: ResetCodeRepository,
    N: NotificationSender,
    L: ActionLog,
{
    pub directory: U,
    pub codes: R,
    pub sender: N,
    pub audit: L,
    pub policy: ResetPolicy,
    pub product_name: String,
}

impl<U, R, N, L> ConfirmResetUseCase<U, R, N, L>
where
    U: IdentityDirectory,
    R: ResetCodeRepository,
    N: NotificationSender,
    L: ActionLog,
{
    pub async fn execute(&self, input: ConfirmResetInput) -> Result<(), RecoveryError> {
        let email = normalize_email(&input.email);
        let code = input.code.trim();
        if email.is_empty() || code.is_empty() || input.new_password.is_empty() {
            return Err(ValidationFailure::ResetFieldsRequired.into());
        }
        if input.new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationFailure::PasswordTooShort.into());
        }

        let Some(identity) = self.directory.find_by_email(&email).await? else {
            let cause = CredentialFailure::UnknownIdentity;
            return Err(self
                .reject(None, &input.meta, cause, Some(email.as_str()))
                .await);
        };

        let attempt = self
            .codes
            .attempt(identity.id, &email, code, Utc::now(), &self.policy)
            .await?;

        let cause = match attempt.verdict {
            Verdict::Accepted => None,
            Verdict::Expired => Some(CredentialFailure::Expired),
            Verdict::AlreadyUsed => Some(CredentialFailure::AlreadyUsed),
            Verdict::Rejected => Some(CredentialFailure::UnknownCode),
            Verdict::Exhausted => {
                info!(
                    user_id = %identity.id,
                    code_id = ?attempt.code_id,
                    attempts = attempt.attempts,
                    cause = Termination::Exhausted.as_str(),
                    "reset code finalized"
                );
                record_action(
                    &self.audit,
                    ActionLogEntry {
                        user_id: Some(identity.id),
                        action: ACTION_RESET,
                        status: ActionStatus::Failed,
                        details: audit_details(&input.meta, &[("result", "max_attempts_exceeded")]),
                    },
                )
                .await;
                return Err(RecoveryError::AttemptsExceeded);
            }
        };
        if let Some(cause) = cause {
            return Err(self.reject(Some(identity.id), &input.meta, cause, None).await);
        }
        let code_id = attempt
            .code_id
            .context("accepted attempt carries no code id")?;

        self.directory
            .set_credential(&identity, &input.new_password)
            .await?;
        info!(
            user_id = %identity.id,
            code_id = %code_id,
            cause = Termination::Consumed.as_str(),
            "reset code finalized"
        );
        if attempt.superseded > 0 {
            info!(
                user_id = %identity.id,
                count = attempt.superseded,
                cause = Termination::Superseded.as_str(),
                "sibling reset codes finalized"
            );
        }

        self.confirm(&identity, code_id).await;
        record_action(
            &self.audit,
            ActionLogEntry {
                user_id: Some(identity.id),
                action: ACTION_RESET,
                status: ActionStatus::Success,
                details: audit_details(&input.meta, &[]),
            },
        )
        .await;
        Ok(())
    }

    async fn confirm(&self, identity: &Identity, code_id: Uuid) {
        let message = reset_confirmation_message(&self.product_name, identity, code_id);
        if let Err(e) = self.sender.send(&message).await {
            error!(user_id = %identity.id, error = %e, "reset confirmation delivery failed");
        }
    }

    async fn reject(
        &self,
        user_id: Option<Uuid>,
        meta: &RequestMeta,
        cause: CredentialFailure,
        attempted_email: Option<&str>,
    ) -> RecoveryError {
        info!(
            user_id = ?user_id,
            status = "FAILED",
            result = cause.result(),
            "password reset rejected"
        );
        let mut extra = vec![("result", cause.result())];
        if let Some(email) = attempted_email {
            extra.push(("attempted_email", email));
        }
        record_action(
            &self.audit,
            ActionLogEntry {
                user_id,
                action: ACTION_RESET,
                status: ActionStatus::Failed,
                details: audit_details(meta, &extra),
            },
        )
        .await;
        RecoveryError::InvalidCredentials(cause)
    }
}
