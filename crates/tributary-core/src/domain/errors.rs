//! Errors - エラー型と分類
//!
//! # 分類
//! - **Transport**: queue の delete 失敗、object の fetch 失敗
//! - **Malformed input**: envelope の decode 失敗、key の unescape 失敗
//! - cancellation はエラーとして扱わない（shutdown の想定内の結果）
//!
//! どのエラーもプロセスを止めない。core は Monitor に報告して、
//! 影響範囲（message 全体 or record 単体）だけを捨てる。

use thiserror::Error;

/// MessageQueue 実装が返すエラー
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("delete failed for receipt {receipt_handle}: {reason}")]
    DeleteFailed {
        receipt_handle: String,
        reason: String,
    },

    #[error("queue is closed")]
    Closed,

    #[error("{0}")]
    OperationFailed(String),
}

/// ObjectLoader 実装が返すエラー
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("unsupported locator scheme in {0}")]
    UnsupportedScheme(String),

    #[error("invalid locator: {0}")]
    InvalidLocator(String),

    #[error("io error reading {uri}: {source}")]
    Io {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

/// Key の percent-decode 失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnescapeError {
    #[error("invalid escape {escape:?} at byte {offset}")]
    InvalidEscape { escape: String, offset: usize },

    #[error("decoded key is not valid UTF-8")]
    InvalidUtf8,
}

/// IngressError は core が Monitor に報告するエラー
#[derive(Debug, Error)]
pub enum IngressError {
    #[error("sqs: unable to delete: {0}")]
    Delete(#[source] QueueError),

    #[error("sqs: unable to unmarshal: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("sqs: unable to read record #{index}: {source}")]
    Record {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("sqs: unable to unescape key {key:?}: {source}")]
    Unescape {
        key: String,
        #[source]
        source: UnescapeError,
    },

    #[error("s3: unable to load {uri}: {source}")]
    Fetch {
        uri: String,
        #[source]
        source: LoadError,
    },

    #[error("sqs: unable to close: {0}")]
    QueueClose(#[source] QueueError),
}
