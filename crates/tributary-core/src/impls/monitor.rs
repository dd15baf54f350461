//! Monitor の実装
//!
//! - **TracingMonitor**: tracing のイベントとして出力する
//! - **MemoryMonitor**: メモリ上に記録する（テスト・CLI のサマリ用）

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::lock;
use crate::domain::IngressError;
use crate::ports::Monitor;

/// Monitor の呼び出しを tracing に流す
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMonitor;

impl Monitor for TracingMonitor {
    fn error(&self, err: &IngressError) {
        tracing::error!(error = %err, "ingress error");
    }

    fn count1(&self, namespace: &str, name: &str) {
        tracing::debug!(namespace, name, "counter incremented");
    }

    fn duration(&self, namespace: &str, name: &str, started: Instant) {
        tracing::debug!(
            namespace,
            name,
            elapsed = ?started.elapsed(),
            "duration recorded"
        );
    }
}

/// MemoryMonitor は報告内容を保持する
///
/// key は `"{namespace}.{name}"`。
#[derive(Debug, Default)]
pub struct MemoryMonitor {
    errors: Mutex<Vec<String>>,
    counters: Mutex<BTreeMap<String, u64>>,
    durations: Mutex<BTreeMap<String, Vec<Duration>>>,
}

/// MemoryMonitor の内容のコピー
#[derive(Debug, Clone, Default, Serialize)]
pub struct MonitorSnapshot {
    pub errors: Vec<String>,
    pub counters: BTreeMap<String, u64>,
    /// 記録回数
    pub durations: BTreeMap<String, usize>,
}

fn metric_key(namespace: &str, name: &str) -> String {
    format!("{namespace}.{name}")
}

impl MemoryMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 報告されたエラーメッセージ（報告順）
    pub fn errors(&self) -> Vec<String> {
        lock(&self.errors).clone()
    }

    pub fn counter(&self, namespace: &str, name: &str) -> u64 {
        lock(&self.counters)
            .get(&metric_key(namespace, name))
            .copied()
            .unwrap_or(0)
    }

    pub fn durations(&self, namespace: &str, name: &str) -> Vec<Duration> {
        lock(&self.durations)
            .get(&metric_key(namespace, name))
            .cloned()
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            errors: self.errors(),
            counters: lock(&self.counters).clone(),
            durations: lock(&self.durations)
                .iter()
                .map(|(key, samples)| (key.clone(), samples.len()))
                .collect(),
        }
    }
}

impl Monitor for MemoryMonitor {
    fn error(&self, err: &IngressError) {
        lock(&self.errors).push(err.to_string());
    }

    fn count1(&self, namespace: &str, name: &str) {
        *lock(&self.counters)
            .entry(metric_key(namespace, name))
            .or_insert(0) += 1;
    }

    fn duration(&self, namespace: &str, name: &str, started: Instant) {
        lock(&self.durations)
            .entry(metric_key(namespace, name))
            .or_default()
            .push(started.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QueueError;

    #[test]
    fn memory_monitor_accumulates() {
        let monitor = MemoryMonitor::new();
        monitor.count1("s3sqs", "s3readerror");
        monitor.count1("s3sqs", "s3readerror");
        monitor.duration("s3sqs", "s3sqs", Instant::now());
        monitor.error(&IngressError::Delete(QueueError::Closed));

        assert_eq!(monitor.counter("s3sqs", "s3readerror"), 2);
        assert_eq!(monitor.counter("s3sqs", "other"), 0);
        assert_eq!(monitor.durations("s3sqs", "s3sqs").len(), 1);
        assert_eq!(monitor.errors().len(), 1);
    }

    #[test]
    fn snapshot_serializes() {
        let monitor = MemoryMonitor::new();
        monitor.count1("ns", "n");
        let json = serde_json::to_value(monitor.snapshot()).unwrap();
        assert_eq!(json["counters"]["ns.n"], 1);
    }

    #[test]
    fn tracing_monitor_is_callable_without_subscriber() {
        let monitor = TracingMonitor;
        monitor.count1("ns", "n");
        monitor.duration("ns", "n", Instant::now());
        monitor.error(&IngressError::Delete(QueueError::Closed));
    }
}
