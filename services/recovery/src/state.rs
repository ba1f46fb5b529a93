use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::domain::types::ResetPolicy;
use crate::infra::db::{DbActionLog, DbIdentityDirectory, DbResetCodeRepository};
use crate::infra::delivery::{ConsoleSender, FallbackSender, OutboxSender};

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub policy: ResetPolicy,
    pub product_name: String,
    pub delivery_timeout: Duration,
}

impl AppState {
    pub fn identity_directory(&self) -> DbIdentityDirectory {
        DbIdentityDirectory {
            db: self.db.clone(),
        }
    }

    pub fn reset_code_repo(&self) -> DbResetCodeRepository {
        DbResetCodeRepository {
            db: self.db.clone(),
        }
    }

    pub fn action_log(&self) -> DbActionLog {
        DbActionLog {
            db: self.db.clone(),
        }
    }

    pub fn notifier(&self) -> FallbackSender<OutboxSender, ConsoleSender> {
        FallbackSender {
            primary: OutboxSender {
                db: self.db.clone(),
            },
            fallback: ConsoleSender,
            timeout: self.delivery_timeout,
        }
    }
}
