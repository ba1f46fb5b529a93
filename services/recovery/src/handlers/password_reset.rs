use std::convert::Infallible;

use axum::{
    Json,
    extract::{FromRequestParts, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::USER_AGENT, request::Parts},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::types::RequestMeta;
use crate::error::{RecoveryError, ValidationFailure};
use crate::state::AppState;
use crate::usecase::confirm_reset::{ConfirmResetInput, ConfirmResetUseCase};
use crate::usecase::request_reset::{RequestResetInput, RequestResetUseCase};

pub const RESET_REQUESTED_MESSAGE: &str =
    "If an account exists with this email, an OTP has been sent.";
pub const RESET_DONE_MESSAGE: &str = "Password has been reset successfully";

impl<S: Send + Sync> FromRequestParts<S> for RequestMeta {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(request_meta(&parts.headers))
    }
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn request_meta(headers: &HeaderMap) -> RequestMeta {
    let ip_address = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"))
        .map(str::to_owned);
    let user_agent = header_str(headers, USER_AGENT.as_str()).map(str::to_owned);
    RequestMeta {
        ip_address,
        user_agent,
    }
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ── POST /auth/password/forgot ────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

pub async fn request_reset(
    State(state): State<AppState>,
    meta: RequestMeta,
    body: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), RecoveryError> {
    let Json(body) = body.map_err(|rejection| {
        debug!(error = %rejection, "unreadable forgot-password body");
        ValidationFailure::EmailRequired
    })?;
    let usecase = RequestResetUseCase {
        directory: state.identity_directory(),
        codes: state.reset_code_repo(),
        sender: state.notifier(),
        audit: state.action_log(),
        policy: state.policy,
        product_name: state.product_name.clone(),
    };
    usecase
        .execute(RequestResetInput {
            email: body.email.unwrap_or_default(),
            meta,
        })
        .await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: RESET_REQUESTED_MESSAGE,
        }),
    ))
}

// ── POST /auth/password/reset ─────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
    pub new_password: Option<String>,
}

pub async fn confirm_reset(
    State(state): State<AppState>,
    meta: RequestMeta,
    body: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), RecoveryError> {
    let Json(body) = body.map_err(|rejection| {
        debug!(error = %rejection, "unreadable reset-password body");
        ValidationFailure::ResetFieldsRequired
    })?;
    let usecase = ConfirmResetUseCase {
        directory: state.identity_directory(),
        codes: state.reset_code_repo(),
        sender: state.notifier(),
        audit: state.action_log(),
        policy: state.policy,
        product_name: state.product_name.clone(),
    };
    usecase
        .execute(ConfirmResetInput {
            email: body.email.unwrap_or_default(),
            code: body.otp.unwrap_or_default(),
            new_password: body.new_password.unwrap_or_default(),
            meta,
        })
        .await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: RESET_DONE_MESSAGE,
        }),
    ))
}
