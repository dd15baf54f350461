//! ObjectLoader port - object store からの byte fetch
//!
//! Locator URI（`s3://bucket/key` など）を受け取り、object 全体を返す。
//! timeout は実装側の責務。core はキャンセルを伝播しない。

use async_trait::async_trait;

use crate::domain::LoadError;

#[async_trait]
pub trait ObjectLoader: Send + Sync {
    /// Object の payload を全て読み込む
    async fn load(&self, uri: &str) -> Result<Vec<u8>, LoadError>;
}
