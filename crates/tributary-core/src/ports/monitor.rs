//! Monitor port - エラー・カウンタ・所要時間の記録
//!
//! 受け身の collaborator。制御フローには影響しない。
//! 複数の fetch task から同時に呼ばれるので `Send + Sync` を要求する。

use std::time::Instant;

use crate::domain::IngressError;

pub trait Monitor: Send + Sync {
    /// エラーを報告する
    fn error(&self, err: &IngressError);

    /// カウンタを 1 増やす
    fn count1(&self, namespace: &str, name: &str);

    /// `started` からの経過時間を記録する
    fn duration(&self, namespace: &str, name: &str, started: Instant);
}
