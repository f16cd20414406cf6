//! # HaptiBand CLI
//!
//! Command-line interface for HaptiBand haptic bands.
//!
//! ## 双模式架构
//!
//! ### One-shot 模式（推荐用于脚本）
//!
//! ```bash
//! # 配置默认 Hub
//! haptiband-cli config set --address 192.168.4.1 --port 80
//!
//! # 执行操作（内部：连接 -> 发送 -> 断开）
//! haptiband-cli cue forward
//! haptiband-cli send front on
//! haptiband-cli pattern save "turn left" --motors left,front --buzz-ms 200 --two-buzz
//! haptiband-cli pattern test "turn left"
//! ```
//!
//! ### REPL 模式（推荐用于调试）
//!
//! ```bash
//! $ haptiband-cli shell
//! haptiband> connect 192.168.4.1:80
//! haptiband> w
//! haptiband> listen on
//! haptiband> exit
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod modes;

use commands::{ConfigCommand, CueCommand, ListenCommand, PatternCommand, RawCommand, SendCommand};
use modes::oneshot::OneShotMode;
use modes::repl::run_repl;

/// HaptiBand CLI - 触觉头带命令行工具
#[derive(Parser, Debug)]
#[command(name = "haptiband-cli")]
#[command(about = "Command-line interface for HaptiBand haptic bands", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 设置单个电机开关
    Send {
        #[command(flatten)]
        args: SendCommand,
    },

    /// 发送原始命令行
    Raw {
        #[command(flatten)]
        args: RawCommand,
    },

    /// 发送快捷提示（w/a/s/d/z/x/e/q）
    Cue {
        #[command(flatten)]
        args: CueCommand,
    },

    /// 图案库管理
    #[command(subcommand)]
    Pattern(PatternCommand),

    /// 监听遥测并转发到头带
    Listen {
        #[command(flatten)]
        args: ListenCommand,
    },

    /// 启动交互式 Shell（REPL 模式）
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("haptiband_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config(cmd) => cmd.execute().await,

        Commands::Send { args } => OneShotMode::new().await?.send(args).await,

        Commands::Raw { args } => OneShotMode::new().await?.raw(args).await,

        Commands::Cue { args } => OneShotMode::new().await?.cue(args).await,

        Commands::Pattern(cmd) => {
            let mode = OneShotMode::new().await?;
            cmd.execute(&mode).await
        },

        Commands::Listen { args } => OneShotMode::new().await?.listen(args).await,

        Commands::Shell => run_repl().await,
    }
}
