//! IngressConfig - Ingress の設定値
//!
//! 全フィールドに default があるので、JSON などから部分的に読み込める。
//! ファイルや環境変数からの読み込みは呼び出し側（CLI など）の責務。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::DEFAULT_SCHEME;
use crate::ports::PollOptions;

/// Host の並列度に対する同時 fetch 数の倍率
pub const CONCURRENCY_PER_CORE: usize = 3;

/// 同時 fetch 数の default（`3 × available_parallelism`）
pub fn default_concurrency() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cores * CONCURRENCY_PER_CORE
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngressConfig {
    /// 同時に走る fetch task の上限
    pub max_concurrency: usize,
    pub batch_size: u32,
    pub poll_interval_ms: u64,
    pub attribute_names: Vec<String>,
    pub message_attribute_names: Vec<String>,
    /// Locator の scheme
    pub scheme: String,
    /// handler が true を返したら drain loop を止める
    pub stop_on_handler_true: bool,
    pub metrics_namespace: String,
    pub fetch_duration_metric: String,
    pub fetch_failure_metric: String,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_concurrency(),
            batch_size: 1,
            poll_interval_ms: 100,
            attribute_names: Vec::new(),
            message_attribute_names: Vec::new(),
            scheme: DEFAULT_SCHEME.to_string(),
            stop_on_handler_true: false,
            metrics_namespace: "s3sqs".to_string(),
            fetch_duration_metric: "s3sqs".to_string(),
            fetch_failure_metric: "s3readerror".to_string(),
        }
    }
}

impl IngressConfig {
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_stop_on_handler_true(mut self, stop: bool) -> Self {
        self.stop_on_handler_true = stop;
        self
    }

    pub fn poll_options(&self) -> PollOptions {
        PollOptions {
            batch_size: self.batch_size,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            attribute_names: self.attribute_names.clone(),
            message_attribute_names: self.message_attribute_names.clone(),
        }
    }
}
