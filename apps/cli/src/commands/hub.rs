//! 直接作用于 Hub 的命令参数

use super::connection::ConnectArgs;
use anyhow::{Context, Result};
use clap::Args;
use haptiband_client::Cue;
use haptiband_protocol::{Command, DEFAULT_BOARD_ID, MotorChannel, MotorState};

/// 单个电机开关
#[derive(Args, Debug)]
pub struct SendCommand {
    /// 电机（left/front/right/back 或引脚编号）
    pub motor: MotorChannel,

    /// 状态（on/off/1/0）
    pub state: MotorState,

    /// 板 ID
    #[arg(long, default_value_t = DEFAULT_BOARD_ID)]
    pub board: u32,

    #[command(flatten)]
    pub connection: ConnectArgs,
}

impl SendCommand {
    pub fn command(&self) -> Command {
        Command::new(self.board, self.motor, self.state)
    }
}

/// 原始命令行
#[derive(Args, Debug)]
pub struct RawCommand {
    /// 线格式命令，如 `1;18:1`
    pub line: String,

    #[command(flatten)]
    pub connection: ConnectArgs,
}

impl RawCommand {
    pub fn command(&self) -> Result<Command> {
        self.line
            .parse::<Command>()
            .with_context(|| format!("无效的命令: {:?}", self.line))
    }
}

/// 快捷提示
#[derive(Args, Debug)]
pub struct CueCommand {
    /// 按键（w/a/s/d/z/x/e/q）或名称（forward, rotate-left, ...）
    pub cue: Cue,

    #[command(flatten)]
    pub connection: ConnectArgs,
}

/// 遥测监听
#[derive(Args, Debug)]
pub struct ListenCommand {
    /// 只记录遥测，不转发到头带
    #[arg(long)]
    pub log_only: bool,

    #[command(flatten)]
    pub connection: ConnectArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct SendCli {
        #[command(flatten)]
        args: SendCommand,
    }

    #[derive(Parser)]
    struct RawCli {
        #[command(flatten)]
        args: RawCommand,
    }

    #[derive(Parser)]
    struct CueCli {
        #[command(flatten)]
        args: CueCommand,
    }

    #[test]
    fn test_send_args() {
        let cli = SendCli::parse_from(["test", "front", "on", "--port", "8080"]);
        assert_eq!(cli.args.command().to_wire(), "1;18:1");
        assert_eq!(cli.args.connection.port, Some(8080));

        let cli = SendCli::parse_from(["test", "23", "0", "--board", "3"]);
        assert_eq!(cli.args.command().to_wire(), "3;23:0");
    }

    #[test]
    fn test_send_rejects_unknown_motor() {
        assert!(SendCli::try_parse_from(["test", "top", "on"]).is_err());
        assert!(SendCli::try_parse_from(["test", "left", "maybe"]).is_err());
    }

    #[test]
    fn test_raw_command() {
        let cli = RawCli::parse_from(["test", "1;2:hello"]);
        assert_eq!(cli.args.command().unwrap().to_wire(), "1;2:hello");

        let cli = RawCli::parse_from(["test", "garbage"]);
        assert!(cli.args.command().is_err());
    }

    #[test]
    fn test_cue_args() {
        let cli = CueCli::parse_from(["test", "z"]);
        assert_eq!(cli.args.cue, Cue::RotateLeft);

        let cli = CueCli::parse_from(["test", "stop"]);
        assert_eq!(cli.args.cue, Cue::Stop);
    }
}
