//! 电机通道定义
//!
//! 头带上的四个振动电机，按 Hub 固件引脚编号寻址。

use crate::ProtocolError;
use std::fmt;
use std::str::FromStr;

/// 电机通道（引脚）
///
/// 声明顺序即规范顺序：Left, Front, Right, Back。
/// `Ord` 由声明顺序派生，因此 `BTreeSet<MotorChannel>` 按规范顺序迭代。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "u32", into = "u32")
)]
#[repr(u32)]
pub enum MotorChannel {
    /// 左太阳穴（引脚 5）
    Left = 5,
    /// 前额（引脚 18）
    Front = 18,
    /// 右太阳穴（引脚 19）
    Right = 19,
    /// 后脑（引脚 23）
    Back = 23,
}

impl MotorChannel {
    /// 规范顺序（生成和显示都使用此顺序）
    pub const CANONICAL: [MotorChannel; 4] = [
        MotorChannel::Left,
        MotorChannel::Front,
        MotorChannel::Right,
        MotorChannel::Back,
    ];

    /// 获取引脚编号
    pub fn pin(self) -> u32 {
        self as u32
    }

    /// 从引脚编号转换
    pub fn from_pin(pin: u32) -> Result<Self, ProtocolError> {
        match pin {
            5 => Ok(Self::Left),
            18 => Ok(Self::Front),
            19 => Ok(Self::Right),
            23 => Ok(Self::Back),
            other => Err(ProtocolError::UnknownMotor(other.to_string())),
        }
    }

    /// 小写名称
    pub fn name(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Front => "front",
            Self::Right => "right",
            Self::Back => "back",
        }
    }

    /// 将任意顺序（可能重复）的电机集合整理为规范顺序
    pub fn canonicalize(motors: &[MotorChannel]) -> Vec<MotorChannel> {
        Self::CANONICAL
            .iter()
            .copied()
            .filter(|m| motors.contains(m))
            .collect()
    }
}

impl fmt::Display for MotorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (pin {})", self.name(), self.pin())
    }
}

impl FromStr for MotorChannel {
    type Err = ProtocolError;

    /// 接受名称（left/front/right/back）、首字母（l/f/r/b）或引脚编号
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(pin) = s.parse::<u32>() {
            return Self::from_pin(pin);
        }

        match s.to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Self::Left),
            "front" | "f" => Ok(Self::Front),
            "right" | "r" => Ok(Self::Right),
            "back" | "b" => Ok(Self::Back),
            _ => Err(ProtocolError::UnknownMotor(s.to_string())),
        }
    }
}

impl TryFrom<u32> for MotorChannel {
    type Error = ProtocolError;

    fn try_from(pin: u32) -> Result<Self, Self::Error> {
        Self::from_pin(pin)
    }
}

impl From<MotorChannel> for u32 {
    fn from(motor: MotorChannel) -> Self {
        motor.pin()
    }
}
