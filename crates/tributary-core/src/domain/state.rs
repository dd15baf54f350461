//! State - Ingress と fetch task の状態

use serde::{Deserialize, Serialize};

/// Ingress のライフサイクル
///
/// 状態遷移:
/// - NotStarted -> Running（最初の start）
/// - Running -> ShuttingDown（close）
/// - ShuttingDown -> Stopped（drain loop 終了 + 全 permit 返却）
/// - NotStarted -> ShuttingDown -> Stopped（start 前の close）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LifecycleState {
    NotStarted = 0,
    Running = 1,
    ShuttingDown = 2,
    Stopped = 3,
}

impl LifecycleState {
    /// AtomicU8 から復元する
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::NotStarted,
            1 => LifecycleState::Running,
            2 => LifecycleState::ShuttingDown,
            _ => LifecycleState::Stopped,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// close 済み（またはその途中）か
    pub fn is_closing(self) -> bool {
        matches!(self, LifecycleState::ShuttingDown | LifecycleState::Stopped)
    }
}

/// Fetch task の状態
///
/// - Fetching -> Handling -> Done
/// - Fetching -> Failed
///
/// retry は無い。どの終端状態からも戻らない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchState {
    Fetching,
    Handling,
    Done,
    Failed,
}

impl FetchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, FetchState::Done | FetchState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LifecycleState::NotStarted)]
    #[case(LifecycleState::Running)]
    #[case(LifecycleState::ShuttingDown)]
    #[case(LifecycleState::Stopped)]
    fn lifecycle_state_survives_atomic_encoding(#[case] state: LifecycleState) {
        assert_eq!(LifecycleState::from_u8(state.as_u8()), state);
    }

    #[test]
    fn only_shutdown_states_are_closing() {
        assert!(!LifecycleState::NotStarted.is_closing());
        assert!(!LifecycleState::Running.is_closing());
        assert!(LifecycleState::ShuttingDown.is_closing());
        assert!(LifecycleState::Stopped.is_closing());
    }

    #[test]
    fn fetch_terminal_states() {
        assert!(!FetchState::Fetching.is_terminal());
        assert!(!FetchState::Handling.is_terminal());
        assert!(FetchState::Done.is_terminal());
        assert!(FetchState::Failed.is_terminal());
    }

    #[test]
    fn lifecycle_state_serializes_snake_case() {
        let json = serde_json::to_string(&LifecycleState::ShuttingDown).unwrap();
        assert_eq!(json, "\"shutting_down\"");
    }
}
