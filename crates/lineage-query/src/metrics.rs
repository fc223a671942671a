//! Operational counters for one graph instance.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct GraphMetrics {
    queries: AtomicU64,
    query_errors: AtomicU64,
    query_nanos: AtomicU64,
    node_loads: AtomicU64,
    backend_reads: AtomicU64,
    backend_writes: AtomicU64,
    backend_errors: AtomicU64,
    mutations: AtomicU64,
    build_nanos: AtomicU64,
}

/// Point-in-time copy of [`GraphMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub queries: u64,
    pub query_errors: u64,
    pub total_query_time: Duration,
    pub average_query_time: Duration,
    /// Nodes materialized from a non-resident backend
    pub node_loads: u64,
    pub backend_reads: u64,
    pub backend_writes: u64,
    pub backend_errors: u64,
    pub mutations: u64,
    pub build_duration: Duration,
}

impl GraphMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_query(&self, elapsed: Duration, ok: bool) {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.query_nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
        if !ok {
            self.query_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_backend_read(&self) {
        self.backend_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backend_write(&self) {
        self.backend_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backend_error(&self) {
        self.backend_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_node_load(&self) {
        self.node_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_mutation(&self) {
        self.mutations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_build(&self, elapsed: Duration) {
        self.build_nanos
            .store(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let queries = self.queries.load(Ordering::Relaxed);
        let total = Duration::from_nanos(self.query_nanos.load(Ordering::Relaxed));
        MetricsSnapshot {
            queries,
            query_errors: self.query_errors.load(Ordering::Relaxed),
            total_query_time: total,
            average_query_time: if queries == 0 {
                Duration::ZERO
            } else {
                total / queries as u32
            },
            node_loads: self.node_loads.load(Ordering::Relaxed),
            backend_reads: self.backend_reads.load(Ordering::Relaxed),
            backend_writes: self.backend_writes.load(Ordering::Relaxed),
            backend_errors: self.backend_errors.load(Ordering::Relaxed),
            mutations: self.mutations.load(Ordering::Relaxed),
            build_duration: Duration::from_nanos(self.build_nanos.load(Ordering::Relaxed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_averages() {
        let metrics = GraphMetrics::new();
        metrics.record_query(Duration::from_millis(2), true);
        metrics.record_query(Duration::from_millis(4), false);
        metrics.record_mutation();

        let snap = metrics.snapshot();
        assert_eq!(snap.queries, 2);
        assert_eq!(snap.query_errors, 1);
        assert_eq!(snap.average_query_time, Duration::from_millis(3));
        assert_eq!(snap.mutations, 1);
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = GraphMetrics::new().snapshot();
        assert_eq!(snap, MetricsSnapshot::default());
    }
}
