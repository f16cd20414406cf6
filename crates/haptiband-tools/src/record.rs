//! 图案记录（持久化格式）
//!
//! 与 `haptic_patterns.json` 中单个条目的布局一致：
//!
//! ```json
//! { "name": "left", "motors": [5], "buzz_length_ms": 100, "two_buzz": false }
//! ```

use crate::error::LibraryError;
use haptiband_protocol::MotorChannel;
use serde::{Deserialize, Serialize};

/// 单个图案
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRecord {
    /// 名称（库中的唯一键）
    pub name: String,
    /// 电机列表（按引脚编号序列化）
    pub motors: Vec<MotorChannel>,
    /// 单次振动时长（毫秒）
    pub buzz_length_ms: u64,
    /// 是否振动两次
    pub two_buzz: bool,
}

impl PatternRecord {
    /// 创建记录，电机按规范顺序整理
    pub fn new(
        name: impl Into<String>,
        motors: &[MotorChannel],
        buzz_length_ms: u64,
        two_buzz: bool,
    ) -> Self {
        Self {
            name: name.into(),
            motors: MotorChannel::canonicalize(motors),
            buzz_length_ms,
            two_buzz,
        }
    }

    /// 校验记录
    ///
    /// # 错误
    /// - 名称为空（去除空白后）
    /// - 电机列表为空
    pub fn validate(&self) -> Result<(), LibraryError> {
        if self.name.trim().is_empty() {
            return Err(LibraryError::invalid(&self.name, "name must not be empty"));
        }
        if self.motors.is_empty() {
            return Err(LibraryError::invalid(
                &self.name,
                "at least one motor must be selected",
            ));
        }
        Ok(())
    }

    /// 一行摘要（列表显示用）
    pub fn summary(&self) -> String {
        let motors: Vec<&str> = self.motors.iter().map(|m| m.name()).collect();
        format!(
            "{} - motors: [{}], buzz: {}ms, two-buzz: {}",
            self.name,
            motors.join(", "),
            self.buzz_length_ms,
            self.two_buzz
        )
    }
}
