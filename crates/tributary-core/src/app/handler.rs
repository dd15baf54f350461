//! PayloadHandler - fetch した payload を受け取る呼び出し側の callback

use async_trait::async_trait;

/// PayloadHandler は fetch に成功した object ごとに 1 回呼ばれる
///
/// 戻り値の扱いは `IngressConfig::stop_on_handler_true` で決まる:
/// - `false`（default）: 無視する
/// - `true`: `true` が返ったら drain loop を止める
///
/// # 使用例
/// ```ignore
/// ingress.start(|payload: Vec<u8>| {
///     println!("{} bytes", payload.len());
///     false
/// });
/// ```
#[async_trait]
pub trait PayloadHandler: Send + Sync + 'static {
    async fn handle(&self, payload: Vec<u8>) -> bool;
}

#[async_trait]
impl<F> PayloadHandler for F
where
    F: Fn(Vec<u8>) -> bool + Send + Sync + 'static,
{
    async fn handle(&self, payload: Vec<u8>) -> bool {
        (self)(payload)
    }
}
