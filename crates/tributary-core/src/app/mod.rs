//! App - アプリケーション層
//!
//! ports を組み合わせて ingestion pipeline を実装します。
//!
//! # 主要コンポーネント
//! - **IngressBuilder**: 構築とワイヤリング（起動時検証）
//! - **Ingress**: ライフサイクル管理（start / close / status）
//! - **DrainLoop**: キューの読み出し（ack→decode→admit→spawn）
//! - **FetchTask**: object の fetch と handler 呼び出し

pub mod builder;
pub mod config;
mod drain_loop;
mod fetch_task;
pub mod handler;
pub mod ingress;
pub mod status;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, IngressBuilder};
pub use self::config::{IngressConfig, default_concurrency};
pub use self::handler::PayloadHandler;
pub use self::ingress::Ingress;
pub use self::status::IngressStatus;
