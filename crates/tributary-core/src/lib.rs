//! tributary-core
//!
//! Object store の「新しいファイル」通知をキューから受け取り、object を fetch して
//! 呼び出し側の handler に渡す ingestion の入口。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（notification, locator, state, errors）
//! - **ports**: 抽象化レイヤー（MessageQueue, ObjectLoader, Monitor）
//! - **app**: アプリケーションロジック（builder, ingress, drain loop, fetch task）
//! - **impls**: 実装（InMemoryQueue, LocalObjectLoader, Monitor 実装）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{Ingress, IngressBuilder, IngressConfig, PayloadHandler};
