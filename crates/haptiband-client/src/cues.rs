//! 快捷提示（按键 → 序列）
//!
//! | 键 | 提示 | 序列 |
//! |---|---|---|
//! | `w` | forward | 前额，两次振动 |
//! | `a` | left | 左太阳穴，两次振动 |
//! | `s` | back | 后脑，两次振动 |
//! | `d` | right | 右太阳穴，两次振动 |
//! | `z` | rotate left | 前额一次，随后左侧一次 |
//! | `x` | rotate right | 前额一次，随后右侧一次 |
//! | `e` | start | 左右同时两次，随后前额一次 |
//! | `q` | stop | 全部电机，两次振动 |

use crate::error::ClientError;
use crate::pattern::Pattern;
use crate::sequence::{Sequence, SequenceStep, TWO_BUZZ_GAP, generate};
use haptiband_protocol::{Command, MotorChannel, MotorState};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// 提示使用的振动时长
pub const CUE_BUZZ_LENGTH: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    Forward,
    Left,
    Back,
    Right,
    RotateLeft,
    RotateRight,
    Start,
    Stop,
}

impl Cue {
    /// 按键盘布局顺序排列
    pub const ALL: [Cue; 8] = [
        Cue::Forward,
        Cue::Left,
        Cue::Back,
        Cue::Right,
        Cue::RotateLeft,
        Cue::RotateRight,
        Cue::Start,
        Cue::Stop,
    ];

    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'w' => Some(Self::Forward),
            'a' => Some(Self::Left),
            's' => Some(Self::Back),
            'd' => Some(Self::Right),
            'z' => Some(Self::RotateLeft),
            'x' => Some(Self::RotateRight),
            'e' => Some(Self::Start),
            'q' => Some(Self::Stop),
            _ => None,
        }
    }

    pub fn key(self) -> char {
        match self {
            Self::Forward => 'w',
            Self::Left => 'a',
            Self::Back => 's',
            Self::Right => 'd',
            Self::RotateLeft => 'z',
            Self::RotateRight => 'x',
            Self::Start => 'e',
            Self::Stop => 'q',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Left => "left",
            Self::Back => "back",
            Self::Right => "right",
            Self::RotateLeft => "rotate-left",
            Self::RotateRight => "rotate-right",
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }

    /// 提示对应的序列
    pub fn sequence(self) -> Sequence {
        use MotorChannel::{Back, Front, Left, Right};

        match self {
            Self::Forward => double_buzz(&[Front]),
            Self::Left => double_buzz(&[Left]),
            Self::Back => double_buzz(&[Back]),
            Self::Right => double_buzz(&[Right]),
            Self::Stop => double_buzz(&MotorChannel::CANONICAL),
            Self::RotateLeft => rotate(Left),
            Self::RotateRight => rotate(Right),
            Self::Start => start(),
        }
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.key())
    }
}

impl FromStr for Cue {
    type Err = ClientError;

    /// 接受按键（`w`）或名称（`forward`）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let by_key = match (chars.next(), chars.next()) {
            (Some(key), None) => Self::from_key(key),
            _ => None,
        };

        by_key
            .or_else(|| {
                Self::ALL
                    .into_iter()
                    .find(|cue| cue.name().eq_ignore_ascii_case(s))
            })
            .ok_or_else(|| ClientError::UnknownCue(s.to_string()))
    }
}

/// 立即关闭全部电机（无等待）
pub fn all_off() -> Sequence {
    Sequence::from_steps(
        MotorChannel::CANONICAL
            .into_iter()
            .map(|motor| step(motor, MotorState::Off, Duration::ZERO))
            .collect(),
    )
}

fn double_buzz(motors: &[MotorChannel]) -> Sequence {
    let pattern = Pattern::new("cue", motors, CUE_BUZZ_LENGTH, true);
    // 电机集合非空，生成不会失败
    generate(&pattern).unwrap_or_default()
}

fn step(motor: MotorChannel, state: MotorState, delay: Duration) -> SequenceStep {
    SequenceStep::new(Command::set(motor, state), delay)
}

/// 前额振动一次，间隔后侧面振动一次
fn rotate(side: MotorChannel) -> Sequence {
    use MotorState::{Off, On};

    Sequence::from_steps(vec![
        step(MotorChannel::Front, On, CUE_BUZZ_LENGTH),
        step(MotorChannel::Front, Off, TWO_BUZZ_GAP),
        step(side, On, CUE_BUZZ_LENGTH),
        step(side, Off, Duration::ZERO),
    ])
}

/// 左右同时振动两次，停顿后前额振动一次
fn start() -> Sequence {
    use MotorChannel::{Front, Left, Right};
    use MotorState::{Off, On};

    Sequence::from_steps(vec![
        step(Left, On, Duration::ZERO),
        step(Right, On, CUE_BUZZ_LENGTH),
        step(Left, Off, Duration::ZERO),
        step(Right, Off, TWO_BUZZ_GAP),
        step(Left, On, Duration::ZERO),
        step(Right, On, CUE_BUZZ_LENGTH),
        step(Left, Off, Duration::ZERO),
        step(Right, Off, CUE_BUZZ_LENGTH),
        step(Front, On, CUE_BUZZ_LENGTH),
        step(Front, Off, Duration::ZERO),
    ])
}
