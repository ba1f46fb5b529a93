#![allow(async_fn_in_trait)]

use axum::http::StatusCode;

/// `GET /healthz`: the process is up and serving.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// A hard dependency that must answer before the service takes traffic.
pub trait ReadinessCheck: Send + Sync {
    fn dependency(&self) -> &'static str;

    async fn check(&self) -> anyhow::Result<()>;
}

/// Body of a service's `GET /readyz`: 200 when `target` answers, 503 otherwise.
pub async fn readiness<P: ReadinessCheck>(target: &P) -> StatusCode {
    match target.check().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(dependency = target.dependency(), error = ?e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
