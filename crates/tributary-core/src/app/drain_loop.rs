//! DrainLoop - キューを読み続けて fetch task を起動するループ
//!
//! # フロー（message ごと）
//! 1. body の無い message は無視
//! 2. delete（ack）してから parse する。delete 失敗なら報告して捨てる（キュー側で再配送される）
//! 3. envelope を decode。失敗なら報告して捨てる（ack 済みなので失われる）
//! 4. record ごとに:
//!    - key を unescape。失敗ならその record だけ捨てる
//!    - limiter の permit を取る（cancel されたら record を捨てる、報告しない）
//!    - fetch task を spawn して、待たずに次へ
//!
//! 重要: permit の待ちと message の待ちだけが cancel を見る。spawn 済みの fetch は見ない。

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span, warn};

use super::fetch_task::FetchTask;
use crate::domain::{IngressError, NotificationEnvelope};
use crate::ports::{MessageQueue, Monitor, QueueMessage};

pub(crate) struct DrainLoop {
    pub(crate) queue: Arc<dyn MessageQueue>,
    pub(crate) monitor: Arc<dyn Monitor>,
    pub(crate) limit: Arc<Semaphore>,
    pub(crate) scheme: String,
    pub(crate) cancel: CancellationToken,
    pub(crate) fetch: FetchTask,
}

impl DrainLoop {
    pub(crate) async fn run(self, mut stream: mpsc::Receiver<QueueMessage>) {
        loop {
            let message = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("drain loop cancelled");
                    return;
                }
                message = stream.recv() => message,
            };

            let Some(message) = message else {
                debug!("message stream ended");
                return;
            };
            self.process(message).await;
        }
    }

    async fn process(&self, message: QueueMessage) {
        let Some(body) = message.body.as_deref() else {
            return;
        };

        if let Err(err) = self.acknowledge(&message).await {
            warn!(message_id = ?message.message_id, "message not acknowledged; skipping");
            self.monitor.error(&err);
            return;
        }

        let envelope = match NotificationEnvelope::decode(body) {
            Ok(envelope) => envelope,
            Err(source) => {
                self.monitor.error(&IngressError::Decode(source));
                return;
            }
        };
        debug!(message_id = ?message.message_id, records = envelope.len(), "notification decoded");

        for (index, record) in envelope.into_records() {
            let record = match record {
                Ok(record) => record,
                Err(source) => {
                    self.monitor.error(&IngressError::Record { index, source });
                    continue;
                }
            };

            let locator = match record.locator(&self.scheme) {
                Ok(locator) => locator,
                Err(source) => {
                    self.monitor.error(&IngressError::Unescape {
                        key: record.raw_key().to_string(),
                        source,
                    });
                    continue;
                }
            };

            let Some(permit) = self.admit().await else {
                debug!(locator = %locator, "shutdown while waiting for capacity; record dropped");
                continue;
            };

            let span = info_span!("fetch", locator = %locator);
            tokio::spawn(self.fetch.clone().run(locator, permit).instrument(span));
        }
    }

    /// Message を delete する。receipt handle が無ければ何もしない。
    async fn acknowledge(&self, message: &QueueMessage) -> Result<(), IngressError> {
        if message.receipt_handle.is_none() {
            return Ok(());
        }
        self.queue
            .delete_message(message)
            .await
            .map_err(IngressError::Delete)
    }

    /// Permit を 1 つ取る。cancel が先なら None。
    async fn admit(&self) -> Option<OwnedSemaphorePermit> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            permit = self.limit.clone().acquire_owned() => permit.ok(),
        }
    }
}
