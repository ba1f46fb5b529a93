pub mod confirm_reset;
pub mod request_reset;

use serde_json::{Map, Value};

use crate::domain::repository::ActionLog;
use crate::domain::types::{ActionLogEntry, RequestMeta};

/// Audit writes never change the outcome of the operation being audited.
async fn record_action<L: ActionLog>(audit: &L, entry: ActionLogEntry) {
    if let Err(e) = audit.record(&entry).await {
        tracing::warn!(
            error = ?e,
            action = entry.action,
            status = entry.status.as_str(),
            "failed to write audit entry"
        );
    }
}

fn audit_details(meta: &RequestMeta, extra: &[(&str, &str)]) -> Value {
    let mut details = Map::new();
    details.insert("ip_address".to_owned(), meta.ip_address.clone().into());
    details.insert("user_agent".to_owned(), meta.user_agent.clone().into());
    for (key, value) in extra {
        details.insert((*key).to_owned(), Value::from(*value));
    }
    Value::Object(details)
}
