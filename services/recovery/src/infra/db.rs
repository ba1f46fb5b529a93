use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use uuid::Uuid;

use talaro_recovery_schema::{password_reset_codes, user_action_logs, users};

use crate::domain::repository::{ActionLog, IdentityDirectory, ResetCodeRepository};
use crate::domain::types::{
    ActionLogEntry, Attempt, Identity, ResetCode, ResetPolicy, Verdict,
};
use crate::error::RecoveryError;

// ── Identity directory ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbIdentityDirectory {
    pub db: DatabaseConnection,
}

impl IdentityDirectory for DbIdentityDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, RecoveryError> {
        let model = users::Entity::find()
            .filter(Expr::expr(Func::lower(Expr::col(users::Column::Email))).eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(|m| Identity {
            id: m.id,
            email: m.email,
            full_name: m.full_name,
        }))
    }

    async fn set_credential(
        &self,
        identity: &Identity,
        new_secret: &str,
    ) -> Result<(), RecoveryError> {
        let secret = new_secret.to_owned();
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(secret, bcrypt::DEFAULT_COST))
            .await
            .context("join password hashing task")?
            .context("hash password")?;
        users::ActiveModel {
            id: Set(identity.id),
            password_hash: Set(hash),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("update password hash")?;
        Ok(())
    }
}

// ── Reset code repository ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbResetCodeRepository {
    pub db: DatabaseConnection,
}

impl ResetCodeRepository for DbResetCodeRepository {
    async fn issue(&self, code: &ResetCode) -> Result<u64, RecoveryError> {
        let superseded = self
            .db
            .transaction::<_, u64, DbErr>(|txn| {
                let code = code.clone();
                Box::pin(async move {
                    // Concurrent issuances for one owner queue on the owner's row.
                    lock_owner(txn, code.user_id).await?;
                    insert_reset_code(txn, &code).await?;
                    supersede_others(txn, code.user_id, &code.email, code.id).await
                })
            })
            .await
            .context("issue reset code")?;
        Ok(superseded)
    }

    async fn attempt(
        &self,
        owner: Uuid,
        address: &str,
        presented: &str,
        now: DateTime<Utc>,
        policy: &ResetPolicy,
    ) -> Result<Attempt, RecoveryError> {
        let txn = self.db.begin().await.context("begin verification attempt")?;
        let attempt = evaluate_attempt(&txn, owner, address, presented, now, policy)
            .await
            .context("evaluate verification attempt")?;
        txn.commit().await.context("commit verification attempt")?;
        Ok(attempt)
    }
}

async fn evaluate_attempt(
    txn: &DatabaseTransaction,
    owner: Uuid,
    address: &str,
    presented: &str,
    now: DateTime<Utc>,
    policy: &ResetPolicy,
) -> Result<Attempt, DbErr> {
    let candidate = password_reset_codes::Entity::find()
        .filter(password_reset_codes::Column::UserId.eq(owner))
        .filter(password_reset_codes::Column::Email.eq(address))
        .filter(password_reset_codes::Column::Code.eq(presented))
        .filter(password_reset_codes::Column::Used.eq(false))
        .order_by_desc(password_reset_codes::Column::CreatedAt)
        .one(txn)
        .await?;

    if let Some(candidate) = candidate {
        // Re-read under lock: a concurrent attempt may have finalized it since.
        let Some(locked) = password_reset_codes::Entity::find_by_id(candidate.id)
            .lock_exclusive()
            .one(txn)
            .await?
        else {
            return Ok(Attempt::unmatched());
        };
        let mut code = reset_code_from_model(locked);
        let before = (code.used, code.attempts);
        let verdict = code.verify(now, policy);
        if before != (code.used, code.attempts) {
            save_state(txn, &code).await?;
        }
        let superseded = if verdict == Verdict::Accepted {
            supersede_others(txn, owner, address, code.id).await?
        } else {
            0
        };
        return Ok(Attempt {
            verdict,
            code_id: Some(code.id),
            attempts: code.attempts,
            superseded,
        });
    }

    let outstanding = password_reset_codes::Entity::find()
        .filter(password_reset_codes::Column::UserId.eq(owner))
        .filter(password_reset_codes::Column::Email.eq(address))
        .filter(password_reset_codes::Column::Used.eq(false))
        .order_by_desc(password_reset_codes::Column::CreatedAt)
        .lock_exclusive()
        .one(txn)
        .await?;
    let Some(model) = outstanding else {
        return Ok(Attempt::unmatched());
    };
    let mut code = reset_code_from_model(model);
    let before = code.attempts;
    let verdict = code.charge_mismatch(now, policy);
    if before == code.attempts {
        return Ok(Attempt::unmatched());
    }
    save_state(txn, &code).await?;
    Ok(Attempt {
        verdict,
        code_id: Some(code.id),
        attempts: code.attempts,
        superseded: 0,
    })
}

async fn lock_owner<C: ConnectionTrait>(db: &C, owner: Uuid) -> Result<(), DbErr> {
    users::Entity::find_by_id(owner)
        .lock_exclusive()
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("user {owner}")))?;
    Ok(())
}

async fn insert_reset_code<C: ConnectionTrait>(db: &C, code: &ResetCode) -> Result<(), DbErr> {
    password_reset_codes::ActiveModel {
        id: Set(code.id),
        user_id: Set(code.user_id),
        email: Set(code.email.clone()),
        code: Set(code.code.clone()),
        created_at: Set(code.created_at),
        expires_at: Set(code.expires_at),
        used: Set(code.used),
        attempts: Set(code.attempts),
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn save_state<C: ConnectionTrait>(db: &C, code: &ResetCode) -> Result<(), DbErr> {
    password_reset_codes::ActiveModel {
        id: Set(code.id),
        used: Set(code.used),
        attempts: Set(code.attempts),
        ..Default::default()
    }
    .update(db)
    .await?;
    Ok(())
}

/// Finalize every unused code for `owner` + `address` except `keep`.
async fn supersede_others<C: ConnectionTrait>(
    db: &C,
    owner: Uuid,
    address: &str,
    keep: Uuid,
) -> Result<u64, DbErr> {
    let result = password_reset_codes::Entity::update_many()
        .col_expr(password_reset_codes::Column::Used, Expr::value(true))
        .filter(password_reset_codes::Column::UserId.eq(owner))
        .filter(password_reset_codes::Column::Email.eq(address))
        .filter(password_reset_codes::Column::Used.eq(false))
        .filter(password_reset_codes::Column::Id.ne(keep))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

fn reset_code_from_model(model: password_reset_codes::Model) -> ResetCode {
    ResetCode {
        id: model.id,
        user_id: model.user_id,
        email: model.email,
        code: model.code,
        created_at: model.created_at,
        expires_at: model.expires_at,
        used: model.used,
        attempts: model.attempts,
    }
}

// ── Audit trail ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbActionLog {
    pub db: DatabaseConnection,
}

impl ActionLog for DbActionLog {
    async fn record(&self, entry: &ActionLogEntry) -> Result<(), RecoveryError> {
        user_action_logs::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(entry.user_id),
            action: Set(entry.action.to_owned()),
            status: Set(entry.status.as_str().to_owned()),
            details: Set(entry.details.clone()),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .context("insert user action log")?;
        Ok(())
    }
}
