//! 序列生成器
//!
//! 将图案确定性地展开为有序的 (命令, 等待时间) 列表。
//!
//! # 算法
//!
//! ```text
//! 电机按规范顺序 Left, Front, Right, Back 排列，每个阶段只有最后一个电机带等待：
//!
//!   on   阶段: 每个电机 On，  最后一个等待 buzz_length
//!   off  阶段: 每个电机 Off， 最后一个等待 two_buzz ? 50ms : 0
//!   (two_buzz)
//!   on   阶段: 同上
//!   off  阶段: 最后一个等待 0
//! ```
//!
//! 序列长度为 2n（单次）或 4n（两次），最后一步总是 Off。
//!
//! # 示例
//!
//! ```rust
//! use haptiband_client::{Pattern, generate};
//! use haptiband_protocol::MotorChannel;
//! use std::time::Duration;
//!
//! let pattern = Pattern::new("forward", &[MotorChannel::Front], Duration::from_millis(100), false);
//! let sequence = generate(&pattern)?;
//! assert_eq!(sequence.wire_lines(), vec!["1;18:1", "1;18:0"]);
//! # Ok::<(), haptiband_client::ClientError>(())
//! ```

use crate::error::ClientError;
use crate::pattern::Pattern;
use haptiband_protocol::{Command, DEFAULT_BOARD_ID, MotorChannel, MotorState};
use std::time::Duration;

/// 两次振动之间的固定间隔
pub const TWO_BUZZ_GAP: Duration = Duration::from_millis(50);

/// 序列中的一步
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceStep {
    pub command: Command,
    /// 发送后等待的时间
    pub settle_delay: Duration,
}

impl SequenceStep {
    pub fn new(command: Command, settle_delay: Duration) -> Self {
        Self {
            command,
            settle_delay,
        }
    }
}

/// 有序的步骤列表
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sequence {
    steps: Vec<SequenceStep>,
}

impl Sequence {
    pub fn from_steps(steps: Vec<SequenceStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[SequenceStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SequenceStep> {
        self.steps.iter()
    }

    /// 所有等待时间之和
    pub fn total_delay(&self) -> Duration {
        self.steps.iter().map(|s| s.settle_delay).sum()
    }

    /// 每一步的线格式（不含换行）
    pub fn wire_lines(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.command.to_wire()).collect()
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a SequenceStep;
    type IntoIter = std::slice::Iter<'a, SequenceStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl IntoIterator for Sequence {
    type Item = SequenceStep;
    type IntoIter = std::vec::IntoIter<SequenceStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

/// 生成器配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// 两次振动之间的间隔
    pub two_buzz_gap: Duration,
    /// 命令使用的板 ID
    pub board_id: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            two_buzz_gap: TWO_BUZZ_GAP,
            board_id: DEFAULT_BOARD_ID,
        }
    }
}

/// 使用默认配置生成序列
pub fn generate(pattern: &Pattern) -> Result<Sequence, ClientError> {
    generate_with(pattern, &GeneratorConfig::default())
}

/// 生成序列
///
/// # 错误
/// - `ClientError::InvalidPattern`: 电机集合为空
pub fn generate_with(pattern: &Pattern, config: &GeneratorConfig) -> Result<Sequence, ClientError> {
    let motors = MotorChannel::canonicalize(&pattern.motors);
    if motors.is_empty() {
        return Err(ClientError::InvalidPattern(format!(
            "pattern {:?} has no motors selected",
            pattern.name
        )));
    }

    let buzzes = if pattern.two_buzz { 2 } else { 1 };
    let on_length = Duration::from_millis(pattern.buzz_millis());
    let mut steps = Vec::with_capacity(motors.len() * 2 * buzzes);

    for buzz in 0..buzzes {
        let gap = if buzz + 1 < buzzes {
            config.two_buzz_gap
        } else {
            Duration::ZERO
        };
        push_phase(&mut steps, config.board_id, &motors, MotorState::On, on_length);
        push_phase(&mut steps, config.board_id, &motors, MotorState::Off, gap);
    }

    Ok(Sequence::from_steps(steps))
}

/// 一个阶段：每个电机一步，只有最后一个电机带等待
fn push_phase(
    steps: &mut Vec<SequenceStep>,
    board_id: u32,
    motors: &[MotorChannel],
    state: MotorState,
    tail: Duration,
) {
    let last = motors.len() - 1;
    for (i, &motor) in motors.iter().enumerate() {
        let delay = if i == last { tail } else { Duration::ZERO };
        steps.push(SequenceStep::new(Command::new(board_id, motor, state), delay));
    }
}
