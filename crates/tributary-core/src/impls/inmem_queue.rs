//! InMemoryQueue - 開発・テスト用の MessageQueue
//!
//! # 実装詳細
//! - bounded mpsc channel で message を流す
//! - delete された receipt handle を記録する（ack の検証用）
//! - `fail_deletes(true)` / `fail_close(true)` で delete / close の失敗を注入できる
//! - close で sender を drop するので、残りを読み切った stream は終わる

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::lock;
use crate::domain::QueueError;
use crate::ports::{MessageQueue, PollOptions, QueueMessage};

pub struct InMemoryQueue {
    sender: Mutex<Option<mpsc::Sender<QueueMessage>>>,
    receiver: Mutex<Option<mpsc::Receiver<QueueMessage>>>,
    capacity: usize,
    deleted: Mutex<Vec<String>>,
    delete_calls: AtomicUsize,
    fail_deletes: AtomicBool,
    fail_close: AtomicBool,
    closed: AtomicBool,
    poll_options: Mutex<Option<PollOptions>>,
}

impl InMemoryQueue {
    /// `capacity` 件まで buffer できるキューを作る
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(Some(receiver)),
            capacity,
            deleted: Mutex::new(Vec::new()),
            delete_calls: AtomicUsize::new(0),
            fail_deletes: AtomicBool::new(false),
            fail_close: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            poll_options: Mutex::new(None),
        }
    }

    /// Message を投入する。buffer が一杯なら空くまで待つ。
    pub async fn push(&self, message: QueueMessage) -> Result<(), QueueError> {
        let sender = lock(&self.sender).clone().ok_or(QueueError::Closed)?;
        sender.send(message).await.map_err(|_| QueueError::Closed)
    }

    /// まだ consumer に読まれていない message の数
    pub fn pending(&self) -> usize {
        match lock(&self.sender).as_ref() {
            Some(sender) => self.capacity - sender.capacity(),
            None => 0,
        }
    }

    /// 以降の delete を失敗させる
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// close を失敗させる。stream は閉じたうえでエラーを返す
    pub fn fail_close(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::SeqCst);
    }

    /// delete に成功した receipt handle（呼ばれた順）
    pub fn deleted(&self) -> Vec<String> {
        lock(&self.deleted).clone()
    }

    /// delete_message が呼ばれた回数（失敗を含む）
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// 最後の start_polling に渡されたパラメータ
    pub fn poll_options(&self) -> Option<PollOptions> {
        lock(&self.poll_options).clone()
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    fn start_polling(&self, options: &PollOptions) -> mpsc::Receiver<QueueMessage> {
        *lock(&self.poll_options) = Some(options.clone());
        match lock(&self.receiver).take() {
            Some(receiver) => receiver,
            None => {
                // 再開不可: 2 回目以降は閉じた stream を返す
                let (_sender, receiver) = mpsc::channel(1);
                receiver
            }
        }
    }

    async fn delete_message(&self, message: &QueueMessage) -> Result<(), QueueError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let Some(receipt_handle) = message.receipt_handle.clone() else {
            return Ok(());
        };
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(QueueError::DeleteFailed {
                receipt_handle,
                reason: "injected failure".to_string(),
            });
        }
        lock(&self.deleted).push(receipt_handle);
        Ok(())
    }

    async fn close(&self) -> Result<(), QueueError> {
        self.closed.store(true, Ordering::SeqCst);
        lock(&self.sender).take();
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(QueueError::OperationFailed(
                "injected close failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn push_then_poll() {
        let queue = InMemoryQueue::new(4);
        queue.push(QueueMessage::new("r1", "body")).await.unwrap();
        assert_eq!(queue.pending(), 1);

        let mut stream = queue.start_polling(&PollOptions::default());
        let message = stream.recv().await.unwrap();
        assert_eq!(message.receipt_handle.as_deref(), Some("r1"));
        assert_eq!(message.body.as_deref(), Some("body"));
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test]
    async fn second_poll_returns_closed_stream() {
        let queue = InMemoryQueue::new(4);
        let _first = queue.start_polling(&PollOptions::default());
        let mut second = queue.start_polling(&PollOptions::default());
        assert!(second.recv().await.is_none());
    }

    #[tokio::test]
    async fn delete_records_receipts() {
        let queue = InMemoryQueue::new(4);
        queue
            .delete_message(&QueueMessage::new("r1", "body"))
            .await
            .unwrap();
        assert_eq!(queue.deleted(), vec!["r1".to_string()]);
        assert_eq!(queue.delete_calls(), 1);
    }

    #[tokio::test]
    async fn injected_delete_failure() {
        let queue = InMemoryQueue::new(4);
        queue.fail_deletes(true);
        let result = queue.delete_message(&QueueMessage::new("r1", "body")).await;
        assert!(matches!(result, Err(QueueError::DeleteFailed { .. })));
        assert!(queue.deleted().is_empty());
        assert_eq!(queue.delete_calls(), 1);
    }

    #[tokio::test]
    async fn close_ends_stream_after_buffered_messages() {
        let queue = InMemoryQueue::new(4);
        queue.push(QueueMessage::new("r1", "body")).await.unwrap();
        let mut stream = queue.start_polling(&PollOptions::default());
        queue.close().await.unwrap();

        assert!(queue.is_closed());
        assert!(stream.recv().await.is_some());
        assert!(stream.recv().await.is_none());
        assert!(matches!(
            queue.push(QueueMessage::new("r2", "body")).await,
            Err(QueueError::Closed)
        ));
    }

    #[tokio::test]
    async fn injected_close_failure_still_ends_stream() {
        let queue = InMemoryQueue::new(4);
        queue.fail_close(true);
        let mut stream = queue.start_polling(&PollOptions::default());

        let result = queue.close().await;
        assert!(matches!(result, Err(QueueError::OperationFailed(_))));
        assert!(queue.is_closed());
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn poll_options_are_recorded() {
        let queue = InMemoryQueue::new(4);
        let options = PollOptions {
            batch_size: 10,
            ..PollOptions::default()
        };
        let _stream = queue.start_polling(&options);
        assert_eq!(queue.poll_options(), Some(options));
    }
}
