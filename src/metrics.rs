use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub const REPORT_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Request counters for one server process. Shared behind an `Arc`.
#[derive(Debug)]
pub struct Metrics {
    total: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    response_time_us: AtomicU64,
    started: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub avg_response_time: Duration,
    pub uptime: Duration,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            response_time_us: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn record(&self, success: bool, elapsed: Duration) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.response_time_us.fetch_add(micros, Ordering::Relaxed);
    }

    /// Counters are read independently; the snapshot is not atomic across fields.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let total = self.total.load(Ordering::Relaxed);
        let spent = self.response_time_us.load(Ordering::Relaxed);
        let avg_response_time = if total == 0 { Duration::ZERO } else { Duration::from_micros(spent / total) };
        MetricsSnapshot {
            total,
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            avg_response_time,
            uptime: self.started.elapsed(),
        }
    }

    pub fn log_snapshot(&self) {
        let snap = self.snapshot();
        tracing::info!(
            total_requests = snap.total,
            successful_requests = snap.succeeded,
            failed_requests = snap.failed,
            avg_response_time_ms = snap.avg_response_time.as_millis() as u64,
            uptime = ?snap.uptime,
            "Server metrics"
        );
    }
}

/// Logs a snapshot every `every`, forever. Spawn it next to the listener.
pub async fn report_periodically(metrics: Arc<Metrics>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        metrics.log_snapshot();
    }
}
