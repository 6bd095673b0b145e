use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};

/// All platform metrics in one instance-based handle, built once per host
/// process and cloned cheaply into every component that needs to record
/// something (validator, interceptor, consumer, storage). Never exposed as
/// free-floating statics so a test can construct an isolated `Metrics::new()`
/// and assert deltas without reaching into global state.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Rule catalogue (C2/C4)
    pub checker_invocations_total: IntCounterVec,
    pub checker_violations_total: IntCounterVec,

    // Validation orchestrator (C3)
    pub parse_calls_total: IntCounter,
    pub validate_calls_total: IntCounter,
    pub preparsed_contexts_total: IntCounter,
    pub dedup_hits_total: IntCounter,

    // Kafka consumer pipeline (C7)
    pub messages_consumed_total: IntCounter,
    pub processing_time_seconds: Histogram,
    pub lag_records: IntGauge,
    pub retries_total: IntCounter,
    pub dlq_messages_total: IntCounter,

    // Storage adapter (C9)
    pub writes_total: IntCounterVec,
    pub write_latency_seconds: Histogram,
    pub write_errors_total: IntCounterVec,

    // Scoring engine (C8)
    pub scoring_errors_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let checker_invocations_total = IntCounterVec::new(
            Opts::new("checker_invocations_total", "Number of times a checker ran"),
            &["checker_id"],
        )
        .unwrap();
        let checker_violations_total = IntCounterVec::new(
            Opts::new("checker_violations_total", "Number of violations raised by a checker"),
            &["checker_id", "risk_level"],
        )
        .unwrap();

        let parse_calls_total = IntCounter::new("parse_calls_total", "Number of SQL parse invocations").unwrap();
        let validate_calls_total = IntCounter::new("validate_calls_total", "Number of validation orchestrations run").unwrap();
        let preparsed_contexts_total =
            IntCounter::new("preparsed_contexts_total", "Number of validations that reused an already-parsed statement").unwrap();
        let dedup_hits_total = IntCounter::new("dedup_hits_total", "Number of validation results served from the dedup cache").unwrap();

        let messages_consumed_total =
            IntCounter::new("messages_consumed_total", "Kafka messages consumed by audit-consumer").unwrap();
        let processing_time_seconds = Histogram::with_opts(
            HistogramOpts::new("processing_time_seconds", "Time spent processing one consumed message")
                .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )
        .unwrap();
        let lag_records = IntGauge::new("lag_records", "Consumer group lag in records").unwrap();
        let retries_total = IntCounter::new("retries_total", "Number of message processing retries").unwrap();
        let dlq_messages_total = IntCounter::new("dlq_messages_total", "Number of messages routed to the DLQ").unwrap();

        let writes_total = IntCounterVec::new(Opts::new("writes_total", "Storage writes by repository and outcome"), &["repository", "outcome"]).unwrap();
        let write_latency_seconds = Histogram::with_opts(
            HistogramOpts::new("write_latency_seconds", "Storage write latency").buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0]),
        )
        .unwrap();
        let write_errors_total = IntCounterVec::new(Opts::new("write_errors_total", "Storage write failures by repository"), &["repository"]).unwrap();

        let scoring_errors_total =
            IntCounter::new("scoring_errors_total", "Number of scoring-engine evaluations that failed or panicked").unwrap();

        let registry_targets: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(checker_invocations_total.clone()),
            Box::new(checker_violations_total.clone()),
            Box::new(parse_calls_total.clone()),
            Box::new(validate_calls_total.clone()),
            Box::new(preparsed_contexts_total.clone()),
            Box::new(dedup_hits_total.clone()),
            Box::new(messages_consumed_total.clone()),
            Box::new(processing_time_seconds.clone()),
            Box::new(lag_records.clone()),
            Box::new(retries_total.clone()),
            Box::new(dlq_messages_total.clone()),
            Box::new(writes_total.clone()),
            Box::new(write_latency_seconds.clone()),
            Box::new(write_errors_total.clone()),
            Box::new(scoring_errors_total.clone()),
        ];
        for collector in registry_targets {
            let _ = registry.register(collector);
        }

        Metrics {
            registry,
            checker_invocations_total,
            checker_violations_total,
            parse_calls_total,
            validate_calls_total,
            preparsed_contexts_total,
            dedup_hits_total,
            messages_consumed_total,
            processing_time_seconds,
            lag_records,
            retries_total,
            dlq_messages_total,
            writes_total,
            write_latency_seconds,
            write_errors_total,
            scoring_errors_total,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let m = Metrics::new();
        assert_eq!(m.parse_calls_total.get(), 0);
        assert_eq!(m.validate_calls_total.get(), 0);
    }

    #[test]
    fn each_instance_is_independent() {
        let a = Metrics::new();
        let b = Metrics::new();
        a.parse_calls_total.inc();
        assert_eq!(a.parse_calls_total.get(), 1);
        assert_eq!(b.parse_calls_total.get(), 0);
    }
}
