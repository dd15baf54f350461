//! Ports - 抽象化レイヤー
//!
//! Ingress が依存する外部 capability を trait として定義します。
//! - **MessageQueue**: notification の polling と delete（SQS など）
//! - **ObjectLoader**: object の byte fetch（S3 など）
//! - **Monitor**: エラー・メトリクスの記録
//!
//! 実装は `impls` と、各環境のクレートに置きます。

pub mod message_queue;
pub mod monitor;
pub mod object_loader;

pub use self::message_queue::{MessageQueue, PollOptions, QueueMessage};
pub use self::monitor::Monitor;
pub use self::object_loader::ObjectLoader;
