//! 驱动层错误类型定义

use haptiband_protocol::ProtocolError;
use std::io;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 连接失败（重试耗尽），携带最后一次失败的原因
    #[error("Failed to connect after {attempts} attempt(s): {source}")]
    ConnectFailed {
        attempts: u32,
        #[source]
        source: io::Error,
    },

    /// 链路未连接（从未连接、已断开或已失效）
    #[error("Not connected to hub")]
    NotConnected,

    /// 写入失败，链路已被标记为失效
    #[error("Send failed: {0}")]
    Send(#[source] io::Error),

    /// 读取回复失败（对端关闭或 IO 错误），链路已被标记为失效
    #[error("Receive failed: {0}")]
    Receive(#[source] io::Error),

    /// 等待回复超时（非致命）
    #[error("Operation timeout")]
    Timeout,

    /// 协议错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 后台线程启动失败
    #[error("Failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },
}

impl DriverError {
    /// 是否为致命错误
    ///
    /// 超时不影响链路状态；其余错误意味着链路不可用或命令无效。
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Timeout)
    }

    /// 是否表示链路已断开（需要显式重连）
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::NotConnected | Self::Send(_) | Self::Receive(_))
    }
}
