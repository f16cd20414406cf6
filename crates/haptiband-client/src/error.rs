//! 客户端错误类型

use haptiband_driver::DriverError;
use haptiband_tools::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// 图案无效（如没有选择电机）
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// 驱动层错误（未连接、发送失败等）
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// 图案库错误
    #[error(transparent)]
    Library(#[from] LibraryError),

    /// 未知的提示（按键或名称）
    #[error("Unknown cue: {0:?}")]
    UnknownCue(String),
}

impl ClientError {
    /// 是否因链路不可用而失败（需要重连）
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Driver(e) if e.is_disconnect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ClientError::InvalidPattern("no motors".to_string());
        assert_eq!(err.to_string(), "Invalid pattern: no motors");

        let err: ClientError = DriverError::NotConnected.into();
        assert_eq!(err.to_string(), "Not connected to hub");
        assert!(err.is_disconnect());

        assert!(ClientError::UnknownCue("p".to_string()).to_string().contains("\"p\""));
    }
}
