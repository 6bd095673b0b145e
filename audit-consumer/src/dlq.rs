use chrono::Utc;
use rdkafka::producer::{FutureProducer, FutureRecord};

use crate::model::{DlqRecord, WorkItem};

/// Produces a poisoned message to `<primary>-dlq` (spec.md §4.7/§6), keyed
/// by `sql_id` the same way the primary topic is, so repeated failures of
/// the same statement land on one DLQ partition.
pub struct DlqProducer {
    producer: FutureProducer,
    topic: String,
}

impl DlqProducer {
    pub fn new(producer: FutureProducer, topic: String) -> Self {
        Self { producer, topic }
    }

    pub async fn send(&self, item: &WorkItem, error: String) {
        let record = DlqRecord {
            payload: serde_json::to_value(&item.event).unwrap_or(serde_json::Value::Null),
            error,
            attempts: item.attempt,
            first_seen: item.first_seen,
        };
        let key = item.event.sql_id.clone();
        self.send_record(&record, &key).await;
    }

    /// Routes a message that never became a `WorkItem` — the payload failed
    /// to decode as UTF-8 or to deserialize as JSON, so there is no
    /// `AuditEvent`/`sql_id` to key or retry on (spec.md §4.7: "deserialization
    /// errors go straight to the DLQ, no retry"). `payload` is kept as a
    /// lossy UTF-8 string rather than dropped or base64-wrapped: this is a
    /// debugging artifact, not data anything downstream parses back out.
    pub async fn send_raw(&self, topic: &str, partition: i32, offset: i64, raw_payload: &[u8], error: String) {
        let record = DlqRecord {
            payload: serde_json::Value::String(String::from_utf8_lossy(raw_payload).into_owned()),
            error,
            attempts: 0,
            first_seen: Utc::now(),
        };
        let key = format!("{topic}-{partition}-{offset}");
        self.send_record(&record, &key).await;
    }

    async fn send_record(&self, record: &DlqRecord, key: &str) {
        let payload = match serde_json::to_vec(record) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize dlq record");
                return;
            }
        };
        let kafka_record = FutureRecord::to(&self.topic).key(key).payload(&payload);
        if let Err((e, _)) = self.producer.send(kafka_record, std::time::Duration::from_secs(5)).await {
            tracing::error!(error = %e, topic = %self.topic, "failed to deliver message to dlq");
        }
    }
}

