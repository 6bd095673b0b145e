use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, Notify};

use sqlguard_observability::Metrics;

use crate::model::AuditEvent;

/// Spec.md §4.6: "the writer is an interface with two implementations."
/// Both implementations are fire-and-forget from the caller's perspective —
/// `emit` never blocks the hot path waiting on I/O or a broker round trip.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn emit(&self, event: AuditEvent);
}

/// Bounded in-memory queue in front of a newline-delimited-JSON append-only
/// file. Overflow drops the oldest queued event rather than blocking the
/// caller or growing unbounded (spec.md §4.6) — a data sink is allowed to
/// lose events under sustained overload, it must never apply backpressure
/// onto the query path that is feeding it. A plain bounded `mpsc` channel
/// cannot implement this: its receiver side is owned by the background
/// writer task, so the producer side has no way to evict the head. A shared
/// `VecDeque` behind a `Mutex`, paired with a `Notify` to wake the writer,
/// gives `emit` synchronous access to the whole queue.
pub struct LocalLogSink {
    queue: Arc<Mutex<VecDeque<AuditEvent>>>,
    notify: Arc<Notify>,
    capacity: usize,
    metrics: Arc<Metrics>,
}

impl LocalLogSink {
    pub fn new(path: impl Into<String>, capacity: usize, metrics: Arc<Metrics>) -> Self {
        let queue: Arc<Mutex<VecDeque<AuditEvent>>> = Arc::new(Mutex::new(VecDeque::with_capacity(capacity)));
        let notify = Arc::new(Notify::new());
        let path = path.into();

        let writer_queue = queue.clone();
        let writer_notify = notify.clone();
        let writer_metrics = metrics.clone();
        tokio::spawn(async move {
            let file = tokio::fs::OpenOptions::new().create(true).append(true).open(&path).await;
            let mut file = match file {
                Ok(f) => f,
                Err(e) => {
                    tracing::error!(error = %e, path = %path, "failed to open local audit log");
                    return;
                }
            };
            loop {
                writer_notify.notified().await;
                loop {
                    let event = writer_queue.lock().await.pop_front();
                    let Some(event) = event else { break };
                    match serde_json::to_vec(&event) {
                        Ok(mut line) => {
                            line.push(b'\n');
                            if let Err(e) = file.write_all(&line).await {
                                tracing::error!(error = %e, "failed to append audit event to local log");
                                writer_metrics.write_errors_total.with_label_values(&["local_log"]).inc();
                            }
                        }
                        Err(e) => tracing::error!(error = %e, "failed to serialize audit event"),
                    }
                }
            }
        });

        Self { queue, notify, capacity, metrics }
    }
}

#[async_trait]
impl AuditSink for LocalLogSink {
    async fn emit(&self, event: AuditEvent) {
        let dropped = enqueue_dropping_oldest(&mut *self.queue.lock().await, self.capacity, event);
        if dropped {
            self.metrics.write_errors_total.with_label_values(&["local_log_overflow"]).inc();
            tracing::warn!("local audit log queue full, dropped oldest event");
        }
        self.notify.notify_one();
    }
}

/// Pushes `event` onto `queue`, evicting the oldest entry first if already
/// at `capacity`. Returns whether an eviction happened. Free function so the
/// drop-oldest policy itself is testable without a tokio runtime.
fn enqueue_dropping_oldest(queue: &mut VecDeque<AuditEvent>, capacity: usize, event: AuditEvent) -> bool {
    let dropped = if queue.len() >= capacity {
        queue.pop_front();
        true
    } else {
        false
    };
    queue.push_back(event);
    dropped
}

/// Fire-and-forget Kafka sink keyed by `sql_id` so all executions of the
/// same statement land on the same partition. Unlike the teacher's
/// `AuditProducer::emit`, which awaits the send future inline with a 5s
/// timeout and returns a `Result`, this sink spawns the send and only logs
/// the outcome — spec.md §4.6/§7 require the writer never throw into the
/// calling thread.
pub struct KafkaSink {
    producer: FutureProducer,
    topic: String,
    metrics: Arc<Metrics>,
}

impl KafkaSink {
    pub fn new(producer: FutureProducer, topic: impl Into<String>, metrics: Arc<Metrics>) -> Self {
        Self { producer, topic: topic.into(), metrics }
    }
}

#[async_trait]
impl AuditSink for KafkaSink {
    async fn emit(&self, event: AuditEvent) {
        let payload = match serde_json::to_vec(&event) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize audit event for kafka");
                return;
            }
        };
        let key = event.sql_id.clone();
        let producer = self.producer.clone();
        let topic = self.topic.clone();
        let metrics = self.metrics.clone();
        tokio::spawn(async move {
            let record = FutureRecord::to(&topic).key(&key).payload(&payload);
            if let Err((e, _)) = producer.send(record, std::time::Duration::from_secs(5)).await {
                tracing::error!(error = %e, topic = %topic, "audit event delivery to kafka failed");
                metrics.write_errors_total.with_label_values(&["kafka"]).inc();
            } else {
                metrics.writes_total.with_label_values(&["kafka", "ok"]).inc();
            }
        });
    }
}
