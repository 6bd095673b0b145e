use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tokio_util::time::DelayQueue;

use crate::model::WorkItem;

/// Computes the exponential-backoff-with-jitter delay for a given attempt
/// number (spec.md §4.7: "base 200ms, factor 2, jitter ±20%, max 5
/// attempts").
pub fn backoff_delay(base_ms: u64, factor: f64, jitter: f64, attempt: u32) -> Duration {
    let raw = base_ms as f64 * factor.powi(attempt as i32 - 1);
    let jitter_span = raw * jitter;
    let offset = rand::thread_rng().gen_range(-jitter_span..=jitter_span);
    Duration::from_millis((raw + offset).max(0.0) as u64)
}

/// Background actor owning the delay queue: accepts `(item, delay)` pairs
/// and, once expired, forwards the item back onto the main processing
/// channel. Scheduling never blocks a worker slot (spec.md §4.7: "the
/// worker must not block the pool; scheduling is via a delay queue").
pub struct RetryScheduler {
    schedule_tx: mpsc::UnboundedSender<(WorkItem, Duration)>,
}

impl RetryScheduler {
    pub fn spawn(resubmit_tx: mpsc::Sender<WorkItem>) -> Self {
        let (schedule_tx, mut schedule_rx) = mpsc::unbounded_channel::<(WorkItem, Duration)>();
        tokio::spawn(async move {
            let mut queue: DelayQueue<WorkItem> = DelayQueue::new();
            loop {
                tokio::select! {
                    Some((item, delay)) = schedule_rx.recv() => {
                        queue.insert(item, delay);
                    }
                    Some(Ok(expired)) = futures_util::future::poll_fn(|cx| queue.poll_expired(cx)) => {
                        let item = expired.into_inner();
                        if resubmit_tx.send(item).await.is_err() {
                            tracing::warn!("processing channel closed, dropping retry item");
                        }
                    }
                    else => break,
                }
            }
        });
        Self { schedule_tx }
    }

    pub fn schedule(&self, item: WorkItem, delay: Duration) {
        if self.schedule_tx.send((item, delay)).is_err() {
            tracing::error!("retry scheduler task is gone, dropping retry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_geometrically_before_jitter() {
        let d1 = backoff_delay(200, 2.0, 0.0, 1);
        let d2 = backoff_delay(200, 2.0, 0.0, 2);
        let d3 = backoff_delay(200, 2.0, 0.0, 3);
        assert_eq!(d1, Duration::from_millis(200));
        assert_eq!(d2, Duration::from_millis(400));
        assert_eq!(d3, Duration::from_millis(800));
    }

    #[test]
    fn jitter_stays_within_the_configured_span() {
        for _ in 0..50 {
            let d = backoff_delay(200, 2.0, 0.2, 1);
            assert!(d.as_millis() >= 160 && d.as_millis() <= 240);
        }
    }
}
