use std::sync::Arc;
use std::time::Duration;

use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::TopicPartitionList;
use tokio::sync::Mutex;

use sqlguard_audit::AuditEvent;
use sqlguard_observability::Metrics;
use sqlguard_scoring::{ExecutionResult, ScoringEngine};
use sqlguard_storage::{AuditReportRepository, ExecutionLogRepository};

use crate::context::PauseAwareContext;
use crate::dlq::DlqProducer;
use crate::model::WorkItem;
use crate::retry::{backoff_delay, RetryScheduler};

pub struct WorkerContext {
    pub scoring: Arc<ScoringEngine>,
    pub reports: Arc<dyn AuditReportRepository>,
    pub logs: Arc<dyn ExecutionLogRepository>,
    pub metrics: Arc<Metrics>,
    pub retry: Arc<RetryScheduler>,
    pub dlq: Arc<DlqProducer>,
    pub consumer: Arc<StreamConsumer<PauseAwareContext>>,
    pub retry_max_attempts: u32,
    pub retry_base_ms: u64,
    pub retry_factor: f64,
    pub retry_jitter: f64,
}

/// One worker's processing loop: pulls `WorkItem`s off the shared receiver,
/// scores + persists each, and only then stores the Kafka offset
/// (spec.md §4.7: manual ack after durable write). Storage failures are
/// rescheduled through the retry queue rather than retried inline, so a
/// slow/broken downstream never blocks this worker's slot.
pub async fn run_worker(ctx: Arc<WorkerContext>, rx: Arc<Mutex<tokio::sync::mpsc::Receiver<WorkItem>>>) {
    loop {
        let item = {
            let mut guard = rx.lock().await;
            guard.recv().await
        };
        let Some(item) = item else { break };
        process_item(&ctx, item).await;
    }
}

async fn process_item(ctx: &WorkerContext, item: WorkItem) {
    let started = std::time::Instant::now();
    let result = persist(ctx, &item.event).await;
    ctx.metrics.processing_time_seconds.observe(started.elapsed().as_secs_f64());

    match result {
        Ok(()) => {
            ctx.metrics.messages_consumed_total.inc();
            store_offset(ctx, &item);
        }
        Err(e) => {
            if item.attempt >= ctx.retry_max_attempts {
                tracing::error!(error = %e, sql_id = %item.event.sql_id, attempts = item.attempt, "exhausted retries, sending to dlq");
                ctx.dlq.send(&item, e.to_string()).await;
                ctx.metrics.dlq_messages_total.inc();
                store_offset(ctx, &item);
            } else {
                ctx.metrics.retries_total.inc();
                let delay = backoff_delay(ctx.retry_base_ms, ctx.retry_factor, ctx.retry_jitter, item.attempt + 1);
                let mut next = item;
                next.attempt += 1;
                ctx.retry.schedule(next, delay);
            }
        }
    }
}

async fn persist(ctx: &WorkerContext, event: &AuditEvent) -> anyhow::Result<()> {
    let execution_time_ms = event.execution_time_ms.max(0);
    let result = ExecutionResult::new(event.rows_affected, execution_time_ms, event.timestamp)?;
    let result = if let Some(err) = &event.error_message { result.with_error_message(err.clone()) } else { result };

    let report = ctx.scoring.evaluate(event, &result).map_err(|e| {
        ctx.metrics.scoring_errors_total.inc();
        e
    })?;
    ctx.reports.save(&report).await?;
    ctx.logs.log(event).await?;
    Ok(())
}

fn store_offset(ctx: &WorkerContext, item: &WorkItem) {
    let mut tpl = TopicPartitionList::new();
    let _ = tpl.add_partition_offset(&item.topic, item.partition, rdkafka::Offset::Offset(item.offset + 1));
    if let Err(e) = ctx.consumer.store_offsets(&tpl) {
        tracing::error!(error = %e, "failed to store offset");
    }
}

/// Periodic offset commit, separated from `store_offset` so commits happen
/// in batches rather than once per message (spec.md §4.7: manual ack via
/// `store_offset` + periodic `commit_consumer_state`). Also refreshes
/// `lag_records` from the same tick, since both need the assigned
/// partition list and neither is on the hot path.
pub async fn commit_loop(consumer: Arc<StreamConsumer<PauseAwareContext>>, metrics: Arc<Metrics>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        if let Err(e) = consumer.commit_consumer_state(rdkafka::consumer::CommitMode::Async) {
            tracing::warn!(error = %e, "periodic offset commit failed");
        }
        update_lag_gauge(&consumer, &metrics);
    }
}

fn update_lag_gauge(consumer: &StreamConsumer<PauseAwareContext>, metrics: &Metrics) {
    let assignment = match consumer.assignment() {
        Ok(a) => a,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read consumer assignment for lag gauge");
            return;
        }
    };
    let position = match consumer.position() {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read consumer position for lag gauge");
            return;
        }
    };

    let mut total_lag: i64 = 0;
    for elem in assignment.elements() {
        let topic = elem.topic();
        let partition = elem.partition();
        let current = match position.find_partition(topic, partition).map(|p| p.offset()) {
            Some(rdkafka::Offset::Offset(o)) => o,
            _ => 0,
        };
        match consumer.fetch_watermarks(topic, partition, Duration::from_secs(5)) {
            Ok((_, high)) => total_lag += (high - current).max(0),
            Err(e) => tracing::warn!(error = %e, topic, partition, "failed to fetch watermarks for lag gauge"),
        }
    }
    metrics.lag_records.set(total_lag);
}
