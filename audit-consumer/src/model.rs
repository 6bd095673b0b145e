use chrono::{DateTime, Utc};
use serde::Serialize;

use sqlguard_audit::AuditEvent;

/// One unit of work flowing through the bounded queue and the retry
/// scheduler. Carries the Kafka coordinates alongside the parsed event so a
/// worker can `store_offset` after a successful persist without needing to
/// re-look-up the original message (spec.md §4.7: manual ack after durable
/// write).
#[derive(Clone)]
pub struct WorkItem {
    pub event: AuditEvent,
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub attempt: u32,
    pub first_seen: DateTime<Utc>,
}

/// Dead-letter record shape (spec.md §4.7/§6): original payload plus
/// failure metadata.
#[derive(Serialize)]
pub struct DlqRecord {
    pub payload: serde_json::Value,
    #[serde(rename = "_error")]
    pub error: String,
    #[serde(rename = "_attempts")]
    pub attempts: u32,
    #[serde(rename = "_first_seen")]
    pub first_seen: DateTime<Utc>,
}
