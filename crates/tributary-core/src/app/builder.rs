//! IngressBuilder - Ingress の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - capability（queue, loader）が揃っていなければ build() でエラー
//! - 設定値（concurrency, batch size, scheme）も build() 時に検証
//! - monitor は省略可能（TracingMonitor を使う）

use std::sync::Arc;

use tokio::sync::Semaphore;

use super::config::IngressConfig;
use super::ingress::Ingress;
use crate::impls::TracingMonitor;
use crate::ports::{MessageQueue, Monitor, ObjectLoader};

/// BuildError は Ingress 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("message queue is required")]
    MissingQueue,

    #[error("object loader is required")]
    MissingLoader,

    #[error("max_concurrency must be between 1 and {max}, got {value}")]
    InvalidConcurrency { value: usize, max: usize },

    #[error("batch_size must be at least 1")]
    InvalidBatchSize,

    #[error("scheme must not be empty")]
    EmptyScheme,
}

/// IngressConfig を検証して limiter の permit 数を返す
pub(crate) fn validate(config: &IngressConfig) -> Result<u32, BuildError> {
    let max = Semaphore::MAX_PERMITS.min(u32::MAX as usize);
    if config.max_concurrency == 0 || config.max_concurrency > max {
        return Err(BuildError::InvalidConcurrency {
            value: config.max_concurrency,
            max,
        });
    }
    if config.batch_size == 0 {
        return Err(BuildError::InvalidBatchSize);
    }
    if config.scheme.is_empty() {
        return Err(BuildError::EmptyScheme);
    }
    u32::try_from(config.max_concurrency).map_err(|_| BuildError::InvalidConcurrency {
        value: config.max_concurrency,
        max,
    })
}

/// # 使用例
/// ```ignore
/// let ingress = IngressBuilder::new()
///     .queue(Arc::new(queue))
///     .loader(Arc::new(loader))
///     .max_concurrency(8)
///     .build()?;
/// ```
#[derive(Default)]
pub struct IngressBuilder {
    config: IngressConfig,
    queue: Option<Arc<dyn MessageQueue>>,
    loader: Option<Arc<dyn ObjectLoader>>,
    monitor: Option<Arc<dyn Monitor>>,
}

impl IngressBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: IngressConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.max_concurrency = max_concurrency;
        self
    }

    pub fn queue(mut self, queue: Arc<dyn MessageQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn loader(mut self, loader: Arc<dyn ObjectLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn monitor(mut self, monitor: Arc<dyn Monitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn build(self) -> Result<Ingress, BuildError> {
        let queue = self.queue.ok_or(BuildError::MissingQueue)?;
        let loader = self.loader.ok_or(BuildError::MissingLoader)?;
        let monitor = self
            .monitor
            .unwrap_or_else(|| Arc::new(TracingMonitor));
        Ingress::new(queue, loader, monitor, self.config)
    }
}
