//! Ingress - notification キューから object を取り込む
//!
//! ```text
//! queue.start_polling → [DrainLoop] → delete → decode → [Semaphore] → spawn FetchTask
//!                            │                                │
//!                            └─ cancel（close）                └─ loader.load → handler
//! ```
//!
//! # 配送セマンティクス
//! - at-most-once: parse の前に delete する。delete 後の失敗でその notification は失われる
//! - record 間・message 間の処理順は保証しない
//! - close は barrier: limiter の全容量を取り戻すまで返らない

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::builder::{BuildError, validate};
use super::config::IngressConfig;
use super::drain_loop::DrainLoop;
use super::fetch_task::FetchTask;
use super::handler::PayloadHandler;
use super::status::IngressStatus;
use crate::domain::{IngressError, LifecycleState};
use crate::impls::lock;
use crate::ports::{MessageQueue, Monitor, ObjectLoader};

pub struct Ingress {
    queue: Arc<dyn MessageQueue>,
    loader: Arc<dyn ObjectLoader>,
    monitor: Arc<dyn Monitor>,
    config: Arc<IngressConfig>,
    /// 同時 fetch 数の limiter
    limit: Arc<Semaphore>,
    ceiling: u32,
    /// close で cancel する。start ごとに child scope を切る
    shutdown: CancellationToken,
    drains: Mutex<Vec<JoinHandle<()>>>,
    state: AtomicU8,
    /// close の直列化
    closing: tokio::sync::Mutex<()>,
}

impl Ingress {
    /// Capability を受け取って Ingress を作る。limiter は `config.max_concurrency` で確保する。
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        loader: Arc<dyn ObjectLoader>,
        monitor: Arc<dyn Monitor>,
        config: IngressConfig,
    ) -> Result<Self, BuildError> {
        let ceiling = validate(&config)?;
        Ok(Self {
            queue,
            loader,
            monitor,
            config: Arc::new(config),
            limit: Arc::new(Semaphore::new(ceiling as usize)),
            ceiling,
            shutdown: CancellationToken::new(),
            drains: Mutex::new(Vec::new()),
            state: AtomicU8::new(LifecycleState::NotStarted.as_u8()),
            closing: tokio::sync::Mutex::new(()),
        })
    }

    pub fn config(&self) -> &IngressConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn status(&self) -> IngressStatus {
        let ceiling = self.ceiling as usize;
        IngressStatus {
            state: self.state(),
            ceiling,
            in_flight: ceiling.saturating_sub(self.limit.available_permits()),
            draining: lock(&self.drains).iter().any(|drain| !drain.is_finished()),
        }
    }

    fn set_state(&self, state: LifecycleState) -> LifecycleState {
        LifecycleState::from_u8(self.state.swap(state.as_u8(), Ordering::SeqCst))
    }

    /// Polling を開始して、バックグラウンドで drain する。すぐに返る。
    ///
    /// tokio runtime の中で呼ぶこと。2 回呼ぶと新しい cancel scope と consumer で
    /// もう 1 本 drain loop が立つ（どちらも close で止まる）。close 後は何もしない。
    pub fn start(&self, handler: impl PayloadHandler) {
        // NotStarted / Running → Running。close と競合したら close が勝つ
        let transition = self
            .state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                let current = LifecycleState::from_u8(current);
                (!current.is_closing()).then_some(LifecycleState::Running.as_u8())
            })
            .map(LifecycleState::from_u8);
        match transition {
            Err(previous) => {
                let previous = LifecycleState::from_u8(previous);
                warn!(state = ?previous, "start called after close; ignored");
                return;
            }
            Ok(LifecycleState::Running) => warn!("start called twice; arming another drain loop"),
            Ok(_) => {}
        }

        let scope = self.shutdown.child_token();
        let stream = self.queue.start_polling(&self.config.poll_options());
        let fetch = FetchTask {
            loader: Arc::clone(&self.loader),
            monitor: Arc::clone(&self.monitor),
            handler: Arc::new(handler),
            config: Arc::clone(&self.config),
            stop_scope: self.config.stop_on_handler_true.then(|| scope.clone()),
        };
        let drain = DrainLoop {
            queue: Arc::clone(&self.queue),
            monitor: Arc::clone(&self.monitor),
            limit: Arc::clone(&self.limit),
            scheme: self.config.scheme.clone(),
            cancel: scope,
            fetch,
        };

        let handle = tokio::spawn(drain.run(stream));
        lock(&self.drains).push(handle);
        info!(ceiling = self.ceiling, "ingress started");
    }

    /// 停止を要求して、走っている fetch task が全て終わるまで待つ。
    ///
    /// 1. drain loop を cancel（新しい message を読まない）
    /// 2. queue を close
    /// 3. drain loop の終了を待つ
    /// 4. limiter の全容量を取る（= 全 fetch task が permit を返した）
    ///
    /// 2 回目以降の呼び出しは最初の close の完了を待ってから何もせず返る。
    pub async fn close(&self) {
        let _closing = self.closing.lock().await;
        let previous = self.set_state(LifecycleState::ShuttingDown);
        if previous == LifecycleState::Stopped {
            self.set_state(LifecycleState::Stopped);
            return;
        }
        info!(state = ?previous, "ingress shutting down");

        self.shutdown.cancel();
        if let Err(err) = self.queue.close().await {
            self.monitor.error(&IngressError::QueueClose(err));
        }

        let drains = std::mem::take(&mut *lock(&self.drains));
        for drain in drains {
            if let Err(err) = drain.await {
                warn!(error = %err, "drain loop did not exit cleanly");
            }
        }

        debug!(in_flight = self.status().in_flight, "waiting for in-flight fetches");
        match self.limit.acquire_many(self.ceiling).await {
            // barrier を越えたら容量は返す（status の in_flight を 0 に戻す）
            Ok(permits) => drop(permits),
            Err(err) => warn!(error = %err, "limiter closed during shutdown"),
        }

        self.set_state(LifecycleState::Stopped);
        info!("ingress stopped");
    }
}
