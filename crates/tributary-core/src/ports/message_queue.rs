//! MessageQueue port - notification を運ぶキュー（SQS または InMemory）
//!
//! # 設計原則
//! - start_polling は遅延・無限・再開不可の message stream を返す
//! - delete は message 単位の fire-and-forget
//! - close で upstream の polling を止める（stream は sender の drop で終わる）

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::QueueError;

/// キューから受け取った不透明な message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueMessage {
    pub message_id: Option<String>,
    /// delete に使うハンドル。無ければ delete は不要
    pub receipt_handle: Option<String>,
    pub body: Option<String>,
    pub attributes: HashMap<String, String>,
}

impl QueueMessage {
    /// body と receipt handle を持つ message を作る
    pub fn new(receipt_handle: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            message_id: None,
            receipt_handle: Some(receipt_handle.into()),
            body: Some(body.into()),
            attributes: HashMap::new(),
        }
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }
}

/// Polling のパラメータ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
    /// 1 回の receive で取る最大件数
    pub batch_size: u32,
    /// receive の間隔
    pub poll_interval: Duration,
    pub attribute_names: Vec<String>,
    pub message_attribute_names: Vec<String>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            batch_size: 1,
            poll_interval: Duration::from_millis(100),
            attribute_names: Vec::new(),
            message_attribute_names: Vec::new(),
        }
    }
}

/// MessageQueue は notification message を配送する
///
/// # Thread Safety
/// - `Send + Sync` を要求（drain loop と close から同時に呼ばれる）
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Polling を開始して message stream を返す。
    ///
    /// 2 回目以降の呼び出しの挙動は実装次第（新しい consumer を返すか、閉じた stream を返す）。
    fn start_polling(&self, options: &PollOptions) -> mpsc::Receiver<QueueMessage>;

    /// Message をキューから削除する（ack）
    async fn delete_message(&self, message: &QueueMessage) -> Result<(), QueueError>;

    /// Upstream の polling を止める
    async fn close(&self) -> Result<(), QueueError>;
}
