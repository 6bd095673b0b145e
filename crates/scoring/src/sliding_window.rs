use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Fixed-width time bucket (seconds) used to bound memory: a bucket older
/// than `RETAINED_BUCKETS` back from the newest seen is evicted wholesale
/// rather than kept as a growing per-`sql_id` history (spec.md §4.8:
/// "time-bucketed to bound memory").
const BUCKET_WIDTH_SECS: i64 = 60;
const RETAINED_BUCKETS: i64 = 5;

#[derive(Default, Clone, Copy)]
struct BucketCounts {
    total: u32,
    errors: u32,
}

/// Per-`sql_id` sliding window of (total, error) counts keyed by time
/// bucket. `observe` records one outcome and returns the current error rate
/// over all retained buckets for that `sql_id`.
pub struct SqlIdWindow {
    // sql_id -> bucket_index -> counts
    buckets: Mutex<HashMap<String, HashMap<i64, BucketCounts>>>,
}

impl SqlIdWindow {
    pub fn new() -> Self {
        Self { buckets: Mutex::new(HashMap::new()) }
    }

    pub fn observe(&self, sql_id: &str, at: DateTime<Utc>, is_error: bool) -> f64 {
        let bucket = at.timestamp() / BUCKET_WIDTH_SECS;
        let mut guard = self.buckets.lock();
        let per_bucket = guard.entry(sql_id.to_string()).or_default();

        per_bucket.retain(|&b, _| bucket - b <= RETAINED_BUCKETS);

        let counts = per_bucket.entry(bucket).or_default();
        counts.total += 1;
        if is_error {
            counts.errors += 1;
        }

        let (total, errors) = per_bucket.values().fold((0u32, 0u32), |(t, e), c| (t + c.total, e + c.errors));
        if total == 0 {
            0.0
        } else {
            errors as f64 / total as f64
        }
    }
}

impl Default for SqlIdWindow {
    fn default() -> Self {
        Self::new()
    }
}
