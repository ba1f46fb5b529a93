//! sea-orm entities for the credential-recovery service.

pub mod outbox_events;
pub mod password_reset_codes;
pub mod user_action_logs;
pub mod users;
