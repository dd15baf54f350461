//! Status - Ingress の現在の状態

use serde::{Deserialize, Serialize};

use crate::domain::LifecycleState;

/// IngressStatus は Ingress のスナップショット
///
/// `in_flight` は limiter から借りられている permit の数（= 走っている fetch task 数）。
/// close の barrier 中は close 自身が取った permit も含む。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressStatus {
    pub state: LifecycleState,
    pub ceiling: usize,
    pub in_flight: usize,
    /// drain loop がまだ message を読んでいるか
    pub draining: bool,
}

impl IngressStatus {
    /// 空き容量
    pub fn available(&self) -> usize {
        self.ceiling.saturating_sub(self.in_flight)
    }

    /// drain loop が止まり、走っている fetch も無い
    pub fn is_idle(&self) -> bool {
        !self.draining && self.in_flight == 0
    }
}
