use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Caller-fixable input problems. Display text is returned verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    #[error("Email is required")]
    EmailRequired,
    #[error("Email, OTP, and new password are required")]
    ResetFieldsRequired,
    #[error("Password must be at least 8 characters long")]
    PasswordTooShort,
}

/// Why a confirmation was rejected. Kept for logs and the audit trail only;
/// every variant renders the same message to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFailure {
    UnknownIdentity,
    UnknownCode,
    Expired,
    AlreadyUsed,
}

impl CredentialFailure {
    /// Audit `result` tag.
    pub fn result(self) -> &'static str {
        match self {
            Self::UnknownIdentity => "user_not_found",
            Self::UnknownCode => "invalid_otp",
            Self::Expired => "expired_otp",
            Self::AlreadyUsed => "already_used",
        }
    }
}

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid or expired OTP";
pub const INTERNAL_MESSAGE: &str = "An error occurred. Please try again later.";

/// Recovery service error variants.
#[derive(Debug, thiserror::Error)]
pub enum RecoveryError {
    #[error("{0}")]
    Validation(ValidationFailure),
    #[error("Invalid or expired OTP")]
    InvalidCredentials(CredentialFailure),
    #[error("Maximum OTP verification attempts exceeded. Please request a new OTP.")]
    AttemptsExceeded,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl RecoveryError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::InvalidCredentials(_) => "INVALID_CREDENTIALS",
            Self::AttemptsExceeded => "ATTEMPTS_EXCEEDED",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl From<ValidationFailure> for RecoveryError {
    fn from(failure: ValidationFailure) -> Self {
        Self::Validation(failure)
    }
}

impl IntoResponse for RecoveryError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(_) | Self::InvalidCredentials(_) | Self::AttemptsExceeded => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            Self::Internal(e) => {
                // TraceLayer already records 4xx; only the 500 chain needs logging here.
                tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_owned())
            }
        };
        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}
