use anyhow::Context as _;
use axum::{extract::State, http::StatusCode};

use talaro_core::health::{ReadinessCheck, readiness};

use crate::state::AppState;

impl ReadinessCheck for AppState {
    fn dependency(&self) -> &'static str {
        "postgres"
    }

    async fn check(&self) -> anyhow::Result<()> {
        self.db.ping().await.context("ping database")
    }
}

/// `GET /readyz`: ready once Postgres answers.
pub async fn readyz(State(state): State<AppState>) -> StatusCode {
    readiness(&state).await
}
