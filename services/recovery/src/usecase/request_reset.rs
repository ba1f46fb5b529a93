use chrono::Utc;
use rand::RngExt;
use tracing::{error, info};

use crate::domain::message::reset_code_message;
use crate::domain::repository::{
    ActionLog, IdentityDirectory, NotificationSender, ResetCodeRepository,
};
use crate::domain::types::{
    ACTION_RESET_REQUEST, ActionLogEntry, ActionStatus, CODE_LEN, RequestMeta, ResetCode,
    ResetPolicy, Termination, normalize_email,
};
use crate::error::{RecoveryError, ValidationFailure};
use crate::usecase::{audit_details, record_action};

/// Uniform 6-digit numeric code; every digit independent, leading zeros allowed.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

pub struct RequestResetInput {
    pub email: String,
    pub meta: RequestMeta,
}

/// Issues a reset code. Resolves to `Ok(())` whether or not the email is
/// registered and whether or not delivery succeeded.
pub struct RequestResetUseCase<U, R, N, L>
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

impl<U, R, N, L> RequestResetUseCase<U, R, N, L>
where
    U: IdentityDirectory,
    R: ResetCodeRepository,
    N: NotificationSender,
    L: ActionLog,
{
    pub async fn execute(&self, input: RequestResetInput) -> Result<(), RecoveryError> {
        let email = normalize_email(&input.email);
        if email.is_empty() {
            return Err(ValidationFailure::EmailRequired.into());
        }

        let Some(identity) = self.directory.find_by_email(&email).await? else {
            info!(
                status = "FAILED",
                result = "user_not_found",
                "password reset requested for unknown email"
            );
            record_action(
                &self.audit,
                ActionLogEntry {
                    user_id: None,
                    action: ACTION_RESET_REQUEST,
                    status: ActionStatus::Failed,
                    details: audit_details(
                        &input.meta,
                        &[("result", "user_not_found"), ("attempted_email", email.as_str())],
                    ),
                },
            )
            .await;
            return Ok(());
        };

        let code = ResetCode::issue(&identity, generate_code(), Utc::now(), &self.policy);
        let superseded = self.codes.issue(&code).await?;
        info!(
            user_id = %identity.id,
            code_id = %code.id,
            expires_at = %code.expires_at,
            "password reset code issued"
        );
        if superseded > 0 {
            info!(
                user_id = %identity.id,
                count = superseded,
                cause = Termination::Superseded.as_str(),
                "outstanding reset codes finalized"
            );
        }

        let message = reset_code_message(&self.product_name, &identity, &code, &self.policy);
        if let Err(e) = self.sender.send(&message).await {
            // The code stays valid; the user can request another one.
            error!(
                user_id = %identity.id,
                code_id = %code.id,
                error = %e,
                "reset code delivery failed"
            );
        }

        record_action(
            &self.audit,
            ActionLogEntry {
                user_id: Some(identity.id),
                action: ACTION_RESET_REQUEST,
                status: ActionStatus::Success,
                details: audit_details(&input.meta, &[]),
            },
        )
        .await;
        Ok(())
    }
}
