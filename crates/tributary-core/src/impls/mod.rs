//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryQueue**: channel ベースの MessageQueue
//! - **LocalObjectLoader**: ローカルディレクトリを object store とみなす ObjectLoader
//! - **TracingMonitor** / **MemoryMonitor**: Monitor
//!
//! SQS / S3 の実装は別クレートに配置します。

pub mod inmem_queue;
pub mod local_loader;
pub mod monitor;

pub use self::inmem_queue::InMemoryQueue;
pub use self::local_loader::LocalObjectLoader;
pub use self::monitor::{MemoryMonitor, MonitorSnapshot, TracingMonitor};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// poison されていても中身を使う（記録用の状態しか持たないため）
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
