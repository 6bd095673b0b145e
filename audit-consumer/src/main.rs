use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use futures_util::StreamExt;
use prometheus::{Encoder, TextEncoder};
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::producer::FutureProducer;
use rdkafka::{ClientConfig, Message};
use sqlx::PgPool;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

use sqlguard_audit::AuditEvent;
use sqlguard_observability::Metrics;
use sqlguard_scoring::{default_checkers, ScoringCatalogue, ScoringConfig, ScoringEngine};
use sqlguard_storage::{AuditReportRepository, ExecutionLogRepository, PostgresLogRepository, PostgresReportRepository};

mod config;
mod context;
mod dlq;
mod model;
mod retry;
mod worker;

use config::AppConfig;
use context::{PauseAwareContext, PauseState};
use dlq::DlqProducer;
use model::WorkItem;
use retry::RetryScheduler;
use worker::{commit_loop, run_worker, WorkerContext};

#[derive(Clone)]
struct HttpState {
    metrics: Arc<Metrics>,
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics_endpoint(State(state): State<HttpState>) -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let families = state.metrics.registry.gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buf) {
        error!(error = %e, "failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, String::new());
    }
    (StatusCode::OK, String::from_utf8_lossy(&buf).into_owned())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let config = AppConfig::from_env();

    let pool = PgPool::connect(&config.database_url).await?;
    let metrics = Arc::new(Metrics::new());

    let reports: Arc<dyn AuditReportRepository> = Arc::new(PostgresReportRepository::new(pool.clone(), metrics.clone()));
    let logs: Arc<dyn ExecutionLogRepository> = Arc::new(PostgresLogRepository::new(pool.clone(), metrics.clone()));

    let scoring_config = ScoringConfig::default();
    let scoring = Arc::new(ScoringEngine::new(ScoringCatalogue::new(default_checkers(&scoring_config))));

    let pause_state = Arc::new(PauseState::default());
    let consumer_context = PauseAwareContext { pause_state: pause_state.clone() };
    let consumer: Arc<StreamConsumer<PauseAwareContext>> = Arc::new(
        ClientConfig::new()
            .set("bootstrap.servers", &config.kafka_bootstrap)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "false")
            .set("enable.partition.eof", "false")
            .create_with_context(consumer_context)?,
    );
    consumer.subscribe(&[config.topic.as_str()])?;

    let dlq_producer: FutureProducer = ClientConfig::new().set("bootstrap.servers", &config.kafka_bootstrap).create()?;
    let dlq = Arc::new(DlqProducer::new(dlq_producer, config.dlq_topic()));

    let (process_tx, process_rx) = mpsc::channel::<WorkItem>(config.queue_capacity);
    let process_rx = Arc::new(Mutex::new(process_rx));

    let retry_scheduler = Arc::new(RetryScheduler::spawn(process_tx.clone()));

    let worker_ctx = Arc::new(WorkerContext {
        scoring: scoring.clone(),
        reports: reports.clone(),
        logs: logs.clone(),
        metrics: metrics.clone(),
        retry: retry_scheduler.clone(),
        dlq: dlq.clone(),
        consumer: consumer.clone(),
        retry_max_attempts: config.retry_max_attempts,
        retry_base_ms: config.retry_base_ms,
        retry_factor: config.retry_factor,
        retry_jitter: config.retry_jitter,
    });

    let mut worker_handles = Vec::with_capacity(config.concurrency);
    for _ in 0..config.concurrency {
        let ctx = worker_ctx.clone();
        let rx = process_rx.clone();
        worker_handles.push(tokio::spawn(run_worker(ctx, rx)));
    }

    let commit_handle = tokio::spawn(commit_loop(consumer.clone(), metrics.clone(), Duration::from_secs(5)));

    let retention_logs = logs.clone();
    let retention_days = config.retention_days;
    let retention_interval = config.retention_interval();
    let retention_dry_run = config.retention_dry_run;
    let retention_handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(retention_interval);
        loop {
            ticker.tick().await;
            let threshold = chrono::Utc::now() - chrono::Duration::days(retention_days);
            if retention_dry_run {
                let start = chrono::DateTime::<chrono::Utc>::from_timestamp(0, 0).unwrap();
                match retention_logs.count_by_time_range(start, threshold).await {
                    Ok(count) => info!(candidate_count = count, "retention dry run - no deletion performed"),
                    Err(e) => error!(error = %e, "retention count failed"),
                }
                continue;
            }
            match retention_logs.delete_older_than(threshold).await {
                Ok(deleted) => info!(deleted, "retention purge completed"),
                Err(e) => error!(error = %e, "retention purge failed"),
            }
        }
    });

    let http_state = HttpState { metrics: metrics.clone() };
    let http_addr = config.http_addr.clone();
    let http_handle = tokio::spawn(async move {
        let app = Router::new()
            .route("/healthz", get(health))
            .route("/internal/metrics", get(metrics_endpoint))
            .with_state(http_state);
        let listener = match tokio::net::TcpListener::bind(&http_addr).await {
            Ok(l) => l,
            Err(e) => {
                error!(error = %e, addr = %http_addr, "failed to bind http server");
                return;
            }
        };
        info!(addr = %http_addr, "starting audit-consumer http server");
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "http server terminated");
        }
    });

    let shutdown = Arc::new(AtomicBool::new(false));
    let poller_shutdown = shutdown.clone();
    let poller_consumer = consumer.clone();
    let poller_pause_state = pause_state.clone();
    let queue_tx = process_tx.clone();
    let high_watermark = config.high_watermark_count();
    let low_watermark = config.low_watermark_count();
    let poll_timeout = Duration::from_millis(config.poll_timeout_ms);
    let poller_dlq = dlq.clone();
    let poller_metrics = metrics.clone();
    let poller_handle = tokio::spawn(async move {
        let mut stream = poller_consumer.stream();
        while !poller_shutdown.load(Ordering::Relaxed) {
            let message = match tokio::time::timeout(poll_timeout, stream.next()).await {
                Ok(Some(Ok(m))) => m,
                Ok(Some(Err(e))) => {
                    warn!(error = %e, "kafka consumer error");
                    continue;
                }
                Ok(None) => break,
                Err(_) => continue,
            };

            let raw_payload = message.payload().unwrap_or(&[]);
            let payload = match message.payload_view::<str>() {
                Some(Ok(p)) => p,
                Some(Err(e)) => {
                    warn!(error = %e, topic = message.topic(), partition = message.partition(), offset = message.offset(), "non-utf8 kafka payload, routing straight to dlq");
                    poller_dlq.send_raw(message.topic(), message.partition(), message.offset(), raw_payload, format!("non-utf8 payload: {e}")).await;
                    poller_metrics.dlq_messages_total.inc();
                    continue;
                }
                None => continue,
            };

            let event: AuditEvent = match serde_json::from_str(payload) {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, topic = message.topic(), partition = message.partition(), offset = message.offset(), "failed to deserialize audit event, routing straight to dlq");
                    poller_dlq.send_raw(message.topic(), message.partition(), message.offset(), raw_payload, format!("deserialize error: {e}")).await;
                    poller_metrics.dlq_messages_total.inc();
                    continue;
                }
            };

            let item = WorkItem {
                event,
                topic: message.topic().to_string(),
                partition: message.partition(),
                offset: message.offset(),
                attempt: 0,
                first_seen: chrono::Utc::now(),
            };

            if queue_tx.send(item).await.is_err() {
                error!("processing channel closed, stopping poller");
                break;
            }

            let depth = queue_tx.max_capacity() - queue_tx.capacity();
            if depth >= high_watermark && !poller_pause_state.is_paused() {
                if let Ok(assignment) = poller_consumer.assignment() {
                    if poller_consumer.pause(&assignment).is_ok() {
                        poller_pause_state.set(true);
                        warn!(depth, high_watermark, "pausing consumption, queue above high watermark");
                    }
                }
            } else if depth <= low_watermark && poller_pause_state.is_paused() {
                if let Ok(assignment) = poller_consumer.assignment() {
                    if poller_consumer.resume(&assignment).is_ok() {
                        poller_pause_state.set(false);
                        info!(depth, low_watermark, "resuming consumption, queue below low watermark");
                    }
                }
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received, draining in-flight work");
    shutdown.store(true, Ordering::Relaxed);
    let _ = poller_handle.await;
    drop(process_tx);

    let drain_deadline = tokio::time::sleep(Duration::from_secs(30));
    tokio::pin!(drain_deadline);
    for handle in worker_handles {
        tokio::select! {
            _ = handle => {}
            _ = &mut drain_deadline => {
                warn!("drain deadline exceeded, proceeding with shutdown");
                break;
            }
        }
    }

    commit_handle.abort();
    retention_handle.abort();
    http_handle.abort();

    if let Err(e) = consumer.commit_consumer_state(rdkafka::consumer::CommitMode::Sync) {
        warn!(error = %e, "final offset commit failed");
    }

    info!("audit-consumer shut down cleanly");
    Ok(())
}
