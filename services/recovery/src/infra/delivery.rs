use std::time::Duration;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use talaro_recovery_schema::outbox_events;

use crate::domain::message::OutboundMessage;
use crate::domain::repository::{DeliveryError, NotificationSender};

pub const OUTBOX_EMAIL_KIND: &str = "email.send";

/// Durable primary channel: queues the email for the mail relay via the outbox table.
#[derive(Clone)]
pub struct OutboxSender {
    pub db: DatabaseConnection,
}

impl NotificationSender for OutboxSender {
    fn channel(&self) -> &'static str {
        "outbox"
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        let now = Utc::now();
        outbox_events::ActiveModel {
            id: Set(Uuid::now_v7()),
            kind: Set(OUTBOX_EMAIL_KIND.to_owned()),
            payload: Set(json!({
                "to": message.to,
                "subject": message.subject,
                "body": message.body,
            })),
            idempotency_key: Set(message.idempotency_key.clone()),
            attempts: Set(0),
            last_error: Set(None),
            created_at: Set(now),
            next_attempt_at: Set(now),
            processed_at: Set(None),
            failed_at: Set(None),
        }
        .insert(&self.db)
        .await
        .map_err(|e| DeliveryError::Channel {
            channel: self.channel(),
            source: e.into(),
        })?;
        Ok(())
    }
}

/// Fallback channel: writes the rendered message to the `mail.console` log target.
#[derive(Clone, Default)]
pub struct ConsoleSender;

impl NotificationSender for ConsoleSender {
    fn channel(&self) -> &'static str {
        "console"
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        info!(
            target: "mail.console",
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "email"
        );
        Ok(())
    }
}

/// Tries `primary` within `timeout`, then `fallback` exactly once.
pub struct FallbackSender<P, S> {
    pub primary: P,
    pub fallback: S,
    pub timeout: Duration,
}

impl<P, S> NotificationSender for FallbackSender<P, S>
where
    P: NotificationSender,
    S: NotificationSender,
{
    fn channel(&self) -> &'static str {
        "fallback"
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        let primary_error =
            match tokio::time::timeout(self.timeout, self.primary.send(message)).await {
                Ok(Ok(())) => {
                    info!(channel = self.primary.channel(), key = %message.idempotency_key, "message queued");
                    return Ok(());
                }
                Ok(Err(e)) => e,
                Err(_) => DeliveryError::Timeout {
                    channel: self.primary.channel(),
                },
            };
        warn!(
            channel = self.primary.channel(),
            fallback = self.fallback.channel(),
            error = %primary_error,
            "primary delivery failed, using fallback"
        );

        match self.fallback.send(message).await {
            Ok(()) => {
                info!(channel = self.fallback.channel(), key = %message.idempotency_key, "message delivered via fallback");
                Ok(())
            }
            Err(fallback_error) => {
                error!(
                    primary = self.primary.channel(),
                    fallback = self.fallback.channel(),
                    error = %fallback_error,
                    "both delivery channels failed"
                );
                Err(DeliveryError::Exhausted {
                    primary: Box::new(primary_error),
                    fallback: Box::new(fallback_error),
                })
            }
        }
    }
}
