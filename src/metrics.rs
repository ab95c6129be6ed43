use crate::StoreError;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Metrics receives the events of a store
pub trait Metrics: Send + Sync {
    /// an action entered `dispatch`
    fn action_dispatched(&self, _action_type: &str) {}
    /// an action was queued behind an in-flight dispatch
    fn action_queued(&self, _action_type: &str) {}
    /// the reducers produced a new state
    fn action_reduced(&self, _action_type: &str, _duration: Duration) {}
    fn subscriber_notified(&self, _action_type: &str, _count: usize, _duration: Duration) {}
    fn error_occurred(&self, _error: &StoreError) {}
}

/// CountMetrics counts store events
#[derive(Debug, Default)]
pub struct CountMetrics {
    action_dispatched: AtomicUsize,
    action_queued: AtomicUsize,
    action_reduced: AtomicUsize,
    reducer_failed: AtomicUsize,
    subscriber_notified: AtomicUsize,
    last_reduce_micros: AtomicU64,
}

impl Metrics for CountMetrics {
    fn action_dispatched(&self, _action_type: &str) {
        self.action_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    fn action_queued(&self, _action_type: &str) {
        self.action_queued.fetch_add(1, Ordering::Relaxed);
    }

    fn action_reduced(&self, _action_type: &str, duration: Duration) {
        self.action_reduced.fetch_add(1, Ordering::Relaxed);
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.last_reduce_micros.store(micros, Ordering::Relaxed);
    }

    fn subscriber_notified(&self, _action_type: &str, count: usize, _duration: Duration) {
        self.subscriber_notified.fetch_add(count, Ordering::Relaxed);
    }

    fn error_occurred(&self, error: &StoreError) {
        if let StoreError::ReducerError { .. } = error {
            self.reducer_failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// point-in-time copy of [`CountMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub action_dispatched: usize,
    pub action_queued: usize,
    pub action_reduced: usize,
    pub reducer_failed: usize,
    /// total subscriber calls
    pub subscriber_notified: usize,
    pub last_reduce_duration: Duration,
}

impl From<&CountMetrics> for MetricsSnapshot {
    fn from(metrics: &CountMetrics) -> Self {
        Self {
            action_dispatched: metrics.action_dispatched.load(Ordering::Relaxed),
            action_queued: metrics.action_queued.load(Ordering::Relaxed),
            action_reduced: metrics.action_reduced.load(Ordering::Relaxed),
            reducer_failed: metrics.reducer_failed.load(Ordering::Relaxed),
            subscriber_notified: metrics.subscriber_notified.load(Ordering::Relaxed),
            last_reduce_duration: Duration::from_micros(
                metrics.last_reduce_micros.load(Ordering::Relaxed),
            ),
        }
    }
}
