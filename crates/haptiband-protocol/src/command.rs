//! 命令构建与线格式编解码
//!
//! 线格式：`"<board>;<pin>:<state>"`，发送时追加 `\n`。
//! `state` 为 `0`/`1`，或遥测转发时的文本载荷。

use crate::constants::{DEFAULT_BOARD_ID, LINE_TERMINATOR};
use crate::motor::MotorChannel;
use crate::ProtocolError;
use std::fmt;
use std::str::FromStr;

/// 电机开关状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorState {
    On,
    Off,
}

impl MotorState {
    /// 线格式字符（`1` / `0`）
    pub fn as_wire(self) -> char {
        match self {
            Self::On => '1',
            Self::Off => '0',
        }
    }

    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

impl FromStr for MotorState {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "on" | "true" => Ok(Self::On),
            "0" | "off" | "false" => Ok(Self::Off),
            other => Err(ProtocolError::InvalidState(other.to_string())),
        }
    }
}

impl fmt::Display for MotorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::On => "on",
            Self::Off => "off",
        })
    }
}

/// 命令状态字段
///
/// 普通命令携带开关状态；遥测转发命令在同一位置携带文本载荷。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommandPayload {
    State(MotorState),
    Text(String),
}

/// Hub 命令
///
/// 构造时保证线格式中不会出现换行符。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command {
    board_id: u32,
    motor_pin: u32,
    payload: CommandPayload,
}

impl Command {
    /// 创建开关命令
    pub fn new(board_id: u32, motor: MotorChannel, state: MotorState) -> Self {
        Self {
            board_id,
            motor_pin: motor.pin(),
            payload: CommandPayload::State(state),
        }
    }

    /// 使用默认板 ID 创建开关命令
    pub fn set(motor: MotorChannel, state: MotorState) -> Self {
        Self::new(DEFAULT_BOARD_ID, motor, state)
    }

    /// 创建携带文本载荷的命令（遥测转发）
    ///
    /// # 错误
    /// - `ProtocolError::EmbeddedNewline`: 载荷包含 `\r` 或 `\n`
    pub fn with_payload(
        board_id: u32,
        column: u32,
        payload: impl Into<String>,
    ) -> Result<Self, ProtocolError> {
        let payload = payload.into();
        if payload.contains(['\r', '\n']) {
            return Err(ProtocolError::EmbeddedNewline);
        }

        Ok(Self {
            board_id,
            motor_pin: column,
            payload: CommandPayload::Text(payload),
        })
    }

    pub fn board_id(&self) -> u32 {
        self.board_id
    }

    pub fn motor_pin(&self) -> u32 {
        self.motor_pin
    }

    pub fn payload(&self) -> &CommandPayload {
        &self.payload
    }

    /// 对应的电机通道（文本载荷命令或未知引脚返回 `None`）
    pub fn motor(&self) -> Option<MotorChannel> {
        match self.payload {
            CommandPayload::State(_) => MotorChannel::from_pin(self.motor_pin).ok(),
            CommandPayload::Text(_) => None,
        }
    }

    /// 开关状态（文本载荷命令返回 `None`）
    pub fn state(&self) -> Option<MotorState> {
        match self.payload {
            CommandPayload::State(state) => Some(state),
            CommandPayload::Text(_) => None,
        }
    }

    /// 编码为线格式（不含行终止符）
    pub fn to_wire(&self) -> String {
        self.to_string()
    }

    /// 编码为完整的一行（含 `\n`）
    pub fn to_line(&self) -> String {
        let mut line = self.to_wire();
        line.push(LINE_TERMINATOR);
        line
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}:", self.board_id, self.motor_pin)?;
        match &self.payload {
            CommandPayload::State(state) => write!(f, "{}", state.as_wire()),
            CommandPayload::Text(text) => f.write_str(text),
        }
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    /// 解析线格式（容忍末尾的 `\r\n`）
    ///
    /// `0`/`1` 解析为开关状态，其余内容解析为文本载荷。
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        let malformed = |reason| ProtocolError::MalformedCommand {
            line: trimmed.to_string(),
            reason,
        };

        let (board, rest) = trimmed.split_once(';').ok_or_else(|| malformed("missing ';'"))?;
        let (pin, value) = rest.split_once(':').ok_or_else(|| malformed("missing ':'"))?;

        let board_id = board.trim().parse::<u32>().map_err(|_| malformed("invalid board id"))?;
        let motor_pin = pin.trim().parse::<u32>().map_err(|_| malformed("invalid pin"))?;

        let payload = match value {
            "0" => CommandPayload::State(MotorState::Off),
            "1" => CommandPayload::State(MotorState::On),
            text => {
                if text.contains(['\r', '\n']) {
                    return Err(ProtocolError::EmbeddedNewline);
                }
                CommandPayload::Text(text.to_string())
            },
        };

        Ok(Self {
            board_id,
            motor_pin,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_encoding() {
        let cmd = Command::set(MotorChannel::Front, MotorState::On);
        assert_eq!(cmd.to_wire(), "1;18:1");
        assert_eq!(cmd.to_line(), "1;18:1\n");

        let cmd = Command::new(3, MotorChannel::Left, MotorState::Off);
        assert_eq!(cmd.to_wire(), "3;5:0");
    }

    #[test]
    fn test_payload_command() {
        let cmd = Command::with_payload(1, 2, "12.3,45.6|0.1,0.2,0.3").unwrap();
        assert_eq!(cmd.to_wire(), "1;2:12.3,45.6|0.1,0.2,0.3");
        assert_eq!(cmd.state(), None);
        assert_eq!(cmd.motor(), None);
    }

    #[test]
    fn test_payload_rejects_newline() {
        assert_eq!(
            Command::with_payload(1, 2, "a\nb"),
            Err(ProtocolError::EmbeddedNewline)
        );
        assert_eq!(
            Command::with_payload(1, 2, "a\r"),
            Err(ProtocolError::EmbeddedNewline)
        );
    }

    #[test]
    fn test_parse_state_command() {
        let cmd: Command = "1;19:1\r\n".parse().unwrap();
        assert_eq!(cmd.board_id(), 1);
        assert_eq!(cmd.motor(), Some(MotorChannel::Right));
        assert_eq!(cmd.state(), Some(MotorState::On));
    }

    #[test]
    fn test_parse_payload_command() {
        let cmd: Command = "1;2:gps|imu".parse().unwrap();
        assert_eq!(cmd.payload(), &CommandPayload::Text("gps|imu".to_string()));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            "15:1".parse::<Command>(),
            Err(ProtocolError::MalformedCommand { reason: "missing ';'", .. })
        ));
        assert!(matches!(
            "1;15".parse::<Command>(),
            Err(ProtocolError::MalformedCommand { reason: "missing ':'", .. })
        ));
        assert!(matches!(
            "x;5:1".parse::<Command>(),
            Err(ProtocolError::MalformedCommand { reason: "invalid board id", .. })
        ));
    }

    #[test]
    fn test_motor_state_parse() {
        assert_eq!("on".parse::<MotorState>().unwrap(), MotorState::On);
        assert_eq!("0".parse::<MotorState>().unwrap(), MotorState::Off);
        assert!("maybe".parse::<MotorState>().is_err());
    }
}
