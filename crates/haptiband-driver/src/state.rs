//! 连接状态定义

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// 连接状态
///
/// # 状态转换
///
/// - `Disconnected → Connecting`: 请求连接
/// - `Connecting → Connected`: 建立 socket
/// - `Connecting → Disconnected`: 重试耗尽
/// - `Connected → Disconnected`: 显式断开，或发送/读取失败
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ConnectionState {
    #[default]
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
}

impl ConnectionState {
    /// 从 u8 转换
    ///
    /// 如果值无效，返回 Disconnected。
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Connected,
            _ => Self::Disconnected,
        }
    }

    /// 转换为 u8
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        })
    }
}

/// 连接状态（原子版本，用于线程间共享）
#[derive(Debug, Default)]
pub struct AtomicConnectionState {
    inner: AtomicU8,
}

impl AtomicConnectionState {
    pub fn new(state: ConnectionState) -> Self {
        Self {
            inner: AtomicU8::new(state.as_u8()),
        }
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.inner.load(Ordering::Acquire))
    }

    pub fn set(&self, state: ConnectionState) {
        self.inner.store(state.as_u8(), Ordering::Release);
    }

    /// 比较并交换
    ///
    /// 如果当前值等于 `current`，则设置为 `new` 并返回 true
    pub fn compare_exchange(&self, current: ConnectionState, new: ConnectionState) -> bool {
        self.inner
            .compare_exchange(
                current.as_u8(),
                new.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_conversion() {
        assert_eq!(ConnectionState::from_u8(0), ConnectionState::Disconnected);
        assert_eq!(ConnectionState::from_u8(1), ConnectionState::Connecting);
        assert_eq!(ConnectionState::from_u8(2), ConnectionState::Connected);
        assert_eq!(ConnectionState::from_u8(255), ConnectionState::Disconnected);
        assert_eq!(ConnectionState::Connected.as_u8(), 2);
    }

    #[test]
    fn test_atomic_state() {
        let state = AtomicConnectionState::default();
        assert_eq!(state.get(), ConnectionState::Disconnected);

        state.set(ConnectionState::Connecting);
        assert_eq!(state.get(), ConnectionState::Connecting);

        assert!(state.compare_exchange(ConnectionState::Connecting, ConnectionState::Connected));
        assert!(state.get().is_connected());
        assert!(!state.compare_exchange(ConnectionState::Connecting, ConnectionState::Disconnected));
        assert_eq!(state.get(), ConnectionState::Connected);
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
    }
}
