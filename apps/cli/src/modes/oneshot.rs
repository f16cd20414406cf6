//! One-shot 模式
//!
//! 每个命令独立执行：
//! 1. 读取配置（命令行参数优先）
//! 2. 连接 Hub
//! 3. 执行操作
//! 4. 断开连接

use anyhow::{Context, Result};
use haptiband_client::{Sequence, SequenceScheduler};
use haptiband_driver::{
    CommandChannel, ConnectionManager, DriverError, HubLink, TelemetryMode, TelemetryPoller,
};
use haptiband_protocol::Command;
use tokio::signal;

use crate::commands::{
    CliConfig, ConnectArgs, CueCommand, ListenCommand, RawCommand, SendCommand,
};

/// One-shot 模式
pub struct OneShotMode {
    config: CliConfig,
}

impl OneShotMode {
    /// 读取配置文件创建
    pub async fn new() -> Result<Self> {
        Ok(Self::with_config(CliConfig::load()?))
    }

    pub fn with_config(config: CliConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CliConfig {
        &self.config
    }

    fn connect(&self, args: &ConnectArgs) -> Result<(ConnectionManager, HubLink)> {
        let link_config = args.resolve(&self.config);
        println!("⏳ 连接到 {}...", link_config.socket_label());

        let manager = ConnectionManager::new(link_config);
        let link = manager.connect()?;

        println!("✅ 已连接");
        Ok((manager, link))
    }

    /// 单个电机开关
    pub async fn send(&self, args: SendCommand) -> Result<()> {
        let command = args.command();
        self.send_command(&args.connection, command).await
    }

    /// 原始命令行
    pub async fn raw(&self, args: RawCommand) -> Result<()> {
        let command = args.command()?;
        self.send_command(&args.connection, command).await
    }

    async fn send_command(&self, connection: &ConnectArgs, command: Command) -> Result<()> {
        let (manager, link) = self.connect(connection)?;
        let channel = CommandChannel::new(link).with_timeout(manager.config().reply_timeout);

        let result = channel.send(&command);
        manager.disconnect();

        match result {
            Ok(reply) if reply.is_empty() => println!("✅ {} (无回复)", command),
            Ok(reply) => println!("✅ {} → {}", command, reply),
            Err(DriverError::Timeout) => println!("⚠️  {} 已发送，等待回复超时", command),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// 快捷提示
    pub async fn cue(&self, args: CueCommand) -> Result<()> {
        self.play(&args.connection, args.cue.name(), args.cue.sequence())
            .await
    }

    /// 连接后执行一个序列，完成后断开
    pub async fn play(&self, connection: &ConnectArgs, label: &str, sequence: Sequence) -> Result<()> {
        let (manager, link) = self.connect(connection)?;
        println!("⏳ 播放 {} ({} 步)...", label, sequence.len());

        let scheduler = SequenceScheduler::new(link);
        let result = tokio::task::spawn_blocking(move || scheduler.run(&sequence))
            .await
            .context("序列线程异常退出")?;
        manager.disconnect();

        let report = result?;
        println!(
            "✅ 完成: {} 步, {} 个回复, {} 次超时, 用时 {:?}",
            report.steps_sent, report.replies, report.timeouts, report.elapsed
        );
        Ok(())
    }

    /// 监听遥测直到 Ctrl+C 或 Hub 断开
    pub async fn listen(&self, args: ListenCommand) -> Result<()> {
        let (manager, link) = self.connect(&args.connection)?;
        let mode = if args.log_only {
            TelemetryMode::LogOnly
        } else {
            TelemetryMode::Forward
        };

        let poller = TelemetryPoller::spawn(link, manager.config(), mode)?;
        println!("📡 监听遥测 ({:?})，按 Ctrl+C 停止", mode);

        // 轮询线程退出时发送端被丢弃，打印循环随之结束
        let lines = poller.lines().clone();
        let mut printer = tokio::task::spawn_blocking(move || {
            for line in lines.iter() {
                println!("  {}", line);
            }
        });

        tokio::select! {
            result = signal::ctrl_c() => {
                result.context("无法监听 Ctrl+C")?;
                println!();
                println!("⏳ 停止监听...");
            }
            _ = &mut printer => {
                println!("⚠️  Hub 已关闭连接");
            }
        }

        poller.stop();
        let snapshot = manager.metrics().snapshot();
        manager.disconnect();

        println!(
            "📊 入站 {} 行, 遥测 {} 帧, 转发 {} 帧",
            snapshot.inbound_lines, snapshot.telemetry_frames, snapshot.telemetry_forwarded
        );
        Ok(())
    }
}
