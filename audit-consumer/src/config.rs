use std::env;
use std::time::Duration;

/// Runtime configuration, read from the environment the way the teacher's
/// original `main()` did inline — kept as one flat struct here since the
/// pipeline now has enough knobs (spec.md §6 "Consumer" surface) that
/// threading `env::var` calls through every constructor would be unreadable.
pub struct AppConfig {
    pub database_url: String,
    pub kafka_bootstrap: String,
    pub topic: String,
    pub group_id: String,
    pub concurrency: usize,
    pub queue_capacity: usize,
    pub high_watermark: f64,
    pub low_watermark: f64,
    pub retry_max_attempts: u32,
    pub retry_base_ms: u64,
    pub retry_factor: f64,
    pub retry_jitter: f64,
    pub poll_timeout_ms: u64,
    pub retention_days: i64,
    pub retention_interval_secs: u64,
    pub retention_dry_run: bool,
    pub http_addr: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            kafka_bootstrap: env_or("KAFKA_BOOTSTRAP", "localhost:9092"),
            topic: env_or("AUDIT_TOPIC", "audit.events"),
            group_id: env_or("AUDIT_CONSUMER_GROUP", "audit-consumer"),
            concurrency: env_parse("AUDIT_CONSUMER_CONCURRENCY", num_cpus()),
            queue_capacity: env_parse("AUDIT_CONSUMER_QUEUE_CAPACITY", 256),
            high_watermark: env_parse("AUDIT_CONSUMER_HIGH_WATERMARK", 0.8),
            low_watermark: env_parse("AUDIT_CONSUMER_LOW_WATERMARK", 0.4),
            retry_max_attempts: env_parse("AUDIT_CONSUMER_RETRY_MAX_ATTEMPTS", 5),
            retry_base_ms: env_parse("AUDIT_CONSUMER_RETRY_BASE_MS", 200),
            retry_factor: env_parse("AUDIT_CONSUMER_RETRY_FACTOR", 2.0),
            retry_jitter: env_parse("AUDIT_CONSUMER_RETRY_JITTER", 0.2),
            poll_timeout_ms: env_parse("AUDIT_CONSUMER_POLL_TIMEOUT_MS", 500),
            retention_days: env_parse("AUDIT_RETENTION_DAYS", 30),
            retention_interval_secs: env_parse("AUDIT_RETENTION_INTERVAL_SECS", 600),
            retention_dry_run: env::var("AUDIT_RETENTION_DRY_RUN").ok().map(|v| v == "true").unwrap_or(false),
            http_addr: env_or("AUDIT_CONSUMER_HTTP_ADDR", "0.0.0.0:8090"),
        }
    }

    pub fn dlq_topic(&self) -> String {
        format!("{}-dlq", self.topic)
    }

    pub fn high_watermark_count(&self) -> usize {
        (self.queue_capacity as f64 * self.high_watermark).round() as usize
    }

    pub fn low_watermark_count(&self) -> usize {
        (self.queue_capacity as f64 * self.low_watermark).round() as usize
    }

    pub fn retention_interval(&self) -> Duration {
        Duration::from_secs(self.retention_interval_secs)
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}
