//! FetchTask - 1 つの Locator を fetch して handler に渡す
//!
//! # フロー
//! 1. Locator から URI を作る
//! 2. ObjectLoader::load()（shutdown のキャンセルは伝播しない）
//! 3. 成否に関わらず所要時間を記録
//! 4. 失敗: failure counter + エラー報告で終了（handler は呼ばない、retry しない）
//! 5. 成功: handler を呼ぶ
//! 6. permit を返す（drop。panic 時も返る）

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OwnedSemaphorePermit;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::config::IngressConfig;
use super::handler::PayloadHandler;
use crate::domain::{FetchState, IngressError, Locator};
use crate::ports::{Monitor, ObjectLoader};

/// Fetch task の共有コンテキスト。task ごとに clone される。
#[derive(Clone)]
pub(crate) struct FetchTask {
    pub(crate) loader: Arc<dyn ObjectLoader>,
    pub(crate) monitor: Arc<dyn Monitor>,
    pub(crate) handler: Arc<dyn PayloadHandler>,
    pub(crate) config: Arc<IngressConfig>,
    /// handler が true を返したときに cancel する drain loop の scope
    pub(crate) stop_scope: Option<CancellationToken>,
}

impl FetchTask {
    pub(crate) async fn run(self, locator: Locator, permit: OwnedSemaphorePermit) -> FetchState {
        let state = self.fetch_and_handle(&locator).await;
        drop(permit);
        state
    }

    async fn fetch_and_handle(&self, locator: &Locator) -> FetchState {
        let config = &self.config;
        let uri = locator.uri();

        debug!(uri = %uri, state = ?FetchState::Fetching, "fetching object");
        let started = Instant::now();
        let fetched = self.loader.load(&uri).await;
        self.monitor.duration(
            &config.metrics_namespace,
            &config.fetch_duration_metric,
            started,
        );

        let payload = match fetched {
            Ok(payload) => payload,
            Err(source) => {
                self.monitor
                    .count1(&config.metrics_namespace, &config.fetch_failure_metric);
                self.monitor.error(&IngressError::Fetch { uri, source });
                return FetchState::Failed;
            }
        };

        debug!(uri = %uri, bytes = payload.len(), state = ?FetchState::Handling, "handling payload");
        let stop = self.handler.handle(payload).await;
        if stop {
            match &self.stop_scope {
                Some(scope) => {
                    info!(uri = %uri, "handler requested stop; draining halts");
                    scope.cancel();
                }
                None => debug!(uri = %uri, "handler returned true; ignored"),
            }
        }
        FetchState::Done
    }
}
