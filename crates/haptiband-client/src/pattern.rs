//! 振动图案
//!
//! 图案 = 电机集合 + 单次振动时长 + 是否振动两次。
//! 与 `haptiband_tools::PatternRecord`（持久化格式）互相转换。

use crate::error::ClientError;
use haptiband_protocol::MotorChannel;
use haptiband_tools::PatternRecord;
use std::time::Duration;

/// 振动图案
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// 名称（图案库中的唯一键）
    pub name: String,
    /// 电机集合（规范顺序，无重复）
    pub motors: Vec<MotorChannel>,
    /// 单次振动时长
    pub buzz_length: Duration,
    /// 是否振动两次
    pub two_buzz: bool,
}

impl Pattern {
    /// 创建图案
    ///
    /// 电机按规范顺序整理并去重；时长向下取整到毫秒（持久化精度）；
    /// 空集合在生成序列时报错。
    pub fn new(
        name: impl Into<String>,
        motors: &[MotorChannel],
        buzz_length: Duration,
        two_buzz: bool,
    ) -> Self {
        Self {
            name: name.into(),
            motors: MotorChannel::canonicalize(motors),
            buzz_length: Duration::from_millis(whole_millis(buzz_length)),
            two_buzz,
        }
    }

    /// 振动时长（整毫秒）
    pub fn buzz_millis(&self) -> u64 {
        whole_millis(self.buzz_length)
    }

    /// 转换为持久化记录
    pub fn to_record(&self) -> PatternRecord {
        PatternRecord::new(
            self.name.clone(),
            &self.motors,
            self.buzz_millis(),
            self.two_buzz,
        )
    }
}

/// 超出 u64 的时长饱和到 `u64::MAX` 毫秒
fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl TryFrom<&PatternRecord> for Pattern {
    type Error = ClientError;

    fn try_from(record: &PatternRecord) -> Result<Self, Self::Error> {
        record.validate()?;
        Ok(Self::new(
            record.name.clone(),
            &record.motors,
            Duration::from_millis(record.buzz_length_ms),
            record.two_buzz,
        ))
    }
}

impl From<&Pattern> for PatternRecord {
    fn from(pattern: &Pattern) -> Self {
        pattern.to_record()
    }
}
