//! # HaptiBand Protocol
//!
//! 头带 Hub 文本行协议定义（无 IO 依赖）
//!
//! ## 模块
//!
//! - `constants`: 协议常量定义
//! - `motor`: 电机通道（引脚）定义
//! - `command`: 命令构建与线格式编解码
//! - `telemetry`: 遥测帧解析与转换
//!
//! ## 线格式
//!
//! ```text
//! 出站命令:   "<board>;<pin>:<0|1>\n"
//! 转发命令:   "<board>;<column>:<payload>\n"
//! 入站遥测:   "GPS:<data>|IMU:<data>\n"
//! ```

pub mod command;
pub mod constants;
pub mod motor;
pub mod telemetry;

// 重新导出常用类型
pub use command::{Command, CommandPayload, MotorState};
pub use constants::*;
pub use motor::MotorChannel;
pub use telemetry::{TelemetryFrame, translate};

use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Unknown motor: {0}")]
    UnknownMotor(String),

    #[error("Invalid motor state: {0:?} (expected 0/1/on/off)")]
    InvalidState(String),

    #[error("Payload contains an embedded line break")]
    EmbeddedNewline,

    #[error("Malformed command {line:?}: {reason}")]
    MalformedCommand { line: String, reason: &'static str },

    #[error("Telemetry marker {0:?} not found")]
    MissingMarker(&'static str),
}
