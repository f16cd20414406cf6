//! REPL 模式（交互式 Shell）
//!
//! 专用输入线程 + crossbeam 通道，保留历史记录，不阻塞 tokio。
//! 会话期间保持一条 Hub 链路，提示序列在后台执行。

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use haptiband_client::{Cue, Sequence, SequenceScheduler, all_off, export_library, generate};
use haptiband_driver::{
    CommandChannel, ConnectionManager, DriverError, HubLink, MetricsSnapshot, TelemetryMode,
    TelemetryPoller,
};
use haptiband_protocol::{Command, MotorChannel, MotorState};
use haptiband_tools::{JsonFileStore, PatternRecord, PatternStore};
use rustyline::Editor;
use std::fs;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use crate::commands::CliConfig;
use crate::commands::connection::parse_target;
use crate::commands::pattern::{delete_pattern, find_pattern, list_patterns, save_pattern};

const HISTORY_FILE: &str = ".haptiband_history";

/// 输入通道的检查间隔
const INPUT_POLL: Duration = Duration::from_millis(100);

/// REPL 会话（保持 Hub 连接）
pub struct ReplSession {
    config: CliConfig,
    manager: ConnectionManager,
    poller: Option<TelemetryPoller>,
    store: JsonFileStore,
}

impl ReplSession {
    pub fn new(config: CliConfig) -> Result<Self> {
        let store = config.pattern_store()?;
        let manager = ConnectionManager::new(config.link_config());
        Ok(Self {
            config,
            manager,
            poller: None,
            store,
        })
    }

    /// 连接到 Hub（`target` 为 `host` 或 `host:port`，省略时使用配置）
    pub fn connect(&mut self, target: Option<&str>) -> Result<()> {
        self.stop_listening();

        let mut link_config = self.config.link_config();
        if let Some(target) = target {
            let (host, port) = parse_target(target)?;
            link_config.address = host;
            if let Some(port) = port {
                link_config.port = port;
            }
        }

        println!("⏳ 连接到 {}...", link_config.socket_label());
        self.manager.set_config(link_config);
        let link = self.manager.connect()?;

        println!("✅ 已连接 (link #{}, {})", link.id(), link.peer_addr());
        Ok(())
    }

    /// 断开连接
    pub fn disconnect(&mut self) {
        if !self.manager.is_connected() {
            println!("⚠️  未连接");
            return;
        }

        self.stop_listening();
        self.manager.disconnect();
        println!("✅ 已断开");
    }

    pub fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    /// 状态描述
    pub fn status(&self) -> String {
        match self.manager.link() {
            Some(link) => {
                let telemetry = match self.poller {
                    Some(ref poller) if poller.is_running() => "遥测监听中",
                    Some(_) => "遥测已停止",
                    None => "未监听遥测",
                };
                format!("已连接 {} (link #{}, {})", link.peer_addr(), link.id(), telemetry)
            },
            None => "未连接".to_string(),
        }
    }

    /// 在后台执行序列
    pub fn play(&self, label: String, sequence: Sequence) -> Result<()> {
        let scheduler = SequenceScheduler::new(self.manager.require_link()?);
        println!("▶ {} ({} 步)", label, sequence.len());

        tokio::task::spawn_blocking(move || match scheduler.run(&sequence) {
            Ok(report) => debug!("{} finished: {:?}", label, report),
            Err(e) => eprintln!("❌ {} 失败: {}", label, e),
        });
        Ok(())
    }

    /// 发送单条命令并打印回复
    pub fn send(&self, command: &Command) -> Result<()> {
        let channel = CommandChannel::new(self.manager.require_link()?)
            .with_timeout(self.manager.config().reply_timeout);

        match channel.send(command) {
            Ok(reply) if reply.is_empty() => println!("✅ {}", command),
            Ok(reply) => println!("✅ {} → {}", command, reply),
            Err(DriverError::Timeout) => println!("⚠️  {} 等待回复超时", command),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// 立即关闭全部电机
    ///
    /// 不等待序列闸门：正在播放的序列不会推迟关闭命令。
    pub async fn all_off(&self) -> Result<()> {
        let link = self.manager.require_link()?;
        let timeout = self.manager.config().reply_timeout;

        tokio::task::spawn_blocking(move || switch_off_all(&link, timeout))
            .await
            .context("all-off task failed")??;
        Ok(())
    }

    pub fn start_listening(&mut self, mode: TelemetryMode) -> Result<()> {
        self.stop_listening();
        let link = self.manager.require_link()?;
        self.poller = Some(TelemetryPoller::spawn(link, self.manager.config(), mode)?);
        Ok(())
    }

    /// 停止遥测线程，返回之前是否在监听
    pub fn stop_listening(&mut self) -> bool {
        match self.poller.take() {
            Some(poller) => {
                poller.stop();
                true
            },
            None => false,
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.manager.metrics().snapshot()
    }

    pub fn reset_metrics(&self) {
        self.manager.metrics().reset();
    }

    pub fn store(&self) -> &JsonFileStore {
        &self.store
    }

    /// Ctrl+C：已连接时关闭全部电机
    async fn emergency_off(&self) {
        if !self.is_connected() {
            return;
        }
        match self.all_off().await {
            Ok(()) => eprintln!("🛑 已关闭全部电机"),
            Err(e) => eprintln!("❌ 关闭电机失败: {}", e),
        }
    }
}

/// 逐条发送关闭命令（回复超时不中断）
fn switch_off_all(link: &HubLink, timeout: Duration) -> Result<(), DriverError> {
    for step in all_off().iter() {
        match link.send(&step.command, timeout) {
            Ok(_) => {},
            Err(DriverError::Timeout) => warn!("No reply to {}", step.command),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

impl Drop for ReplSession {
    fn drop(&mut self) {
        self.stop_listening();
    }
}

/// REPL 输入（专用输入线程）
pub struct ReplInput {
    command_rx: Receiver<String>,
    _input_thread: thread::JoinHandle<Result<()>>,
}

impl ReplInput {
    /// 创建专用输入线程（保留历史记录）
    pub fn new() -> Self {
        let (command_tx, command_rx) = bounded::<String>(10);

        // Editor 在输入线程内创建，生命周期与 REPL 会话相同
        let input_thread = thread::spawn(move || {
            use rustyline::history::DefaultHistory;

            let mut rl = Editor::<(), DefaultHistory>::new()
                .map_err(|e| anyhow::anyhow!("Failed to initialize readline: {}", e))?;

            rl.load_history(HISTORY_FILE).ok(); // 首次运行时不存在

            println!("HaptiBand CLI v{} - 交互式 Shell", env!("CARGO_PKG_VERSION"));
            println!("输入 'help' 查看帮助，'exit' 退出");
            println!();

            loop {
                match rl.readline("haptiband> ") {
                    Ok(line) => {
                        let line = line.trim().to_string();

                        if line.is_empty() {
                            continue;
                        }

                        if line == "exit" || line == "quit" {
                            rl.save_history(HISTORY_FILE).ok();
                            let _ = command_tx.send(line);
                            break;
                        }

                        let _ = rl.add_history_entry(line.clone());

                        if command_tx.send(line).is_err() {
                            break; // 主线程已退出
                        }
                    },

                    Err(rustyline::error::ReadlineError::Interrupted) => {
                        // Ctrl+C：交给主线程关闭电机
                        println!("^C");
                        let _ = command_tx.send("SIGINT".to_string());
                    },

                    Err(rustyline::error::ReadlineError::Eof) => {
                        rl.save_history(HISTORY_FILE).ok();
                        break;
                    },

                    Err(err) => {
                        eprintln!("Error: {:?}", err);
                        break;
                    },
                }
            }

            Ok(())
        });

        Self {
            command_rx,
            _input_thread: input_thread,
        }
    }

    /// 等待用户输入，输入线程退出时返回 `None`
    pub async fn recv_command(&self) -> Option<String> {
        loop {
            let rx = self.command_rx.clone();
            let result = tokio::task::spawn_blocking(move || rx.recv_timeout(INPUT_POLL))
                .await
                .ok()?;

            match result {
                Ok(line) => return Some(line),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}

/// 运行 REPL 模式
pub async fn run_repl() -> Result<()> {
    let mut session = ReplSession::new(CliConfig::load()?)?;
    let input = ReplInput::new();

    println!();
    println!("💡 提示: 使用 'connect [host[:port]]' 连接到 Hub，然后用 w/a/s/d/z/x/e/q 发送提示");
    println!();

    loop {
        tokio::select! {
            line = input.recv_command() => {
                let Some(line) = line else {
                    break;
                };

                match line.as_str() {
                    "exit" | "quit" => {
                        println!("👋 再见！");
                        break;
                    }

                    "SIGINT" => session.emergency_off().await,

                    "help" => print_help(),

                    "status" => println!("📊 状态: {}", session.status()),

                    _ => {
                        if let Err(err) = handle_command(&line, &mut session).await {
                            eprintln!("❌ Error: {}", err);
                            print_help_hint(&line);
                        }
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                eprintln!();
                session.emergency_off().await;
                break;
            }
        }
    }

    session.stop_listening();
    Ok(())
}

/// 处理命令
async fn handle_command(line: &str, session: &mut ReplSession) -> Result<()> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    if parts.is_empty() {
        return Ok(());
    }

    match parts[0] {
        "connect" => session.connect(parts.get(1).copied())?,

        "disconnect" => session.disconnect(),

        "cue" => {
            let name = parts.get(1).ok_or_else(|| anyhow::anyhow!("缺少提示名称"))?;
            let cue: Cue = name.parse()?;
            session.play(cue.to_string(), cue.sequence())?;
        },

        "off" => {
            session.all_off().await?;
            println!("✅ 已关闭全部电机");
        },

        "send" => {
            let (motor, state) = match &parts[1..] {
                [motor, state] => (*motor, *state),
                _ => anyhow::bail!("用法: send <motor> <on|off>"),
            };
            let motor: MotorChannel = motor.parse()?;
            let state: MotorState = state.parse()?;
            session.send(&Command::set(motor, state))?;
        },

        "raw" => {
            let wire = parts[1..].join(" ");
            if wire.is_empty() {
                anyhow::bail!("用法: raw <board;pin:value>");
            }
            let command: Command = wire.parse()?;
            session.send(&command)?;
        },

        "pattern" => handle_pattern(session, &parts[1..])?,

        "listen" => handle_listen(session, parts.get(1).copied())?,

        "metrics" => {
            if parts.get(1) == Some(&"reset") {
                session.reset_metrics();
                println!("✅ 指标已清零");
            } else {
                print_metrics(&session.metrics());
            }
        },

        key if key.chars().count() == 1 => {
            let cue = key
                .chars()
                .next()
                .and_then(Cue::from_key)
                .ok_or_else(|| anyhow::anyhow!("未知按键: {}", key))?;
            session.play(cue.to_string(), cue.sequence())?;
        },

        _ => {
            anyhow::bail!("未知命令: {}", parts[0]);
        },
    }

    Ok(())
}

/// 处理 pattern 子命令
fn handle_pattern(session: &ReplSession, args: &[&str]) -> Result<()> {
    let store = session.store();
    let rest = |from: usize| args.get(from..).map(|s| s.join(" ")).unwrap_or_default();

    match args.first().copied() {
        None | Some("list") => {
            for line in list_patterns(store)? {
                println!("  {}", line);
            }
        },

        Some("show") => {
            let pattern = find_pattern(store, &rest(1))?;
            println!("{}", pattern.to_record().summary());
            println!("  {}", generate(&pattern)?.wire_lines().join(" "));
        },

        Some("test") => {
            let name = rest(1);
            let pattern = find_pattern(store, &name)?;
            session.play(name, generate(&pattern)?)?;
        },

        Some("save") => {
            let record = parse_pattern_args(&args[1..])?;
            let summary = record.summary();
            match save_pattern(store, record)? {
                Some(_) => println!("✅ 已更新: {}", summary),
                None => println!("✅ 已保存: {}", summary),
            }
        },

        Some("delete") => {
            let name = rest(1);
            delete_pattern(store, &name)?;
            println!("✅ 已删除: {}", name);
        },

        Some("export") => {
            let text = export_library(&store.load()?)?;
            match args.get(1) {
                Some(path) => {
                    fs::write(path, text).with_context(|| format!("写入导出文件失败: {}", path))?;
                    println!("✅ 已导出到 {}", path);
                },
                None => print!("{}", text),
            }
        },

        Some(other) => anyhow::bail!("未知 pattern 子命令: {}", other),
    }

    Ok(())
}

/// `<name> <motors> [buzz_ms] [two]`
fn parse_pattern_args(args: &[&str]) -> Result<PatternRecord> {
    let (name, motors) = match args {
        [name, motors, ..] => (*name, *motors),
        _ => anyhow::bail!("用法: pattern save <name> <motor,motor,...> [buzz_ms] [two]"),
    };

    let motors = parse_motors(motors)?;
    let buzz_ms = match args.get(2) {
        Some(ms) => ms
            .parse::<u64>()
            .with_context(|| format!("无效的振动时长: {}", ms))?,
        None => 100,
    };
    let two_buzz = match args.get(3).copied() {
        None | Some("one") => false,
        Some("two") => true,
        Some(other) => anyhow::bail!("最后一个参数应为 one 或 two，得到 {}", other),
    };

    Ok(PatternRecord::new(name, &motors, buzz_ms, two_buzz))
}

/// 逗号分隔的电机列表
fn parse_motors(list: &str) -> Result<Vec<MotorChannel>> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<MotorChannel>().map_err(anyhow::Error::from))
        .collect()
}

fn handle_listen(session: &mut ReplSession, arg: Option<&str>) -> Result<()> {
    match arg {
        None | Some("on") => {
            session.start_listening(TelemetryMode::Forward)?;
            println!("📡 遥测监听已开启（转发到头带）");
        },
        Some("log") => {
            session.start_listening(TelemetryMode::LogOnly)?;
            println!("📡 遥测监听已开启（仅记录）");
        },
        Some("off") => {
            if session.stop_listening() {
                println!("✅ 遥测监听已关闭");
            } else {
                warn!("Telemetry listener was not running");
                println!("⚠️  未在监听");
            }
        },
        Some(other) => anyhow::bail!("用法: listen [on|log|off]，得到 {}", other),
    }
    Ok(())
}

fn print_metrics(snapshot: &MetricsSnapshot) {
    println!("📊 链路指标:");
    println!(
        "  连接: {} 次尝试, {} 次失败",
        snapshot.connect_attempts, snapshot.connect_failures
    );
    println!(
        "  命令: {} 条已发送, {} 个回复 ({:.1}%), {} 次超时",
        snapshot.commands_sent,
        snapshot.replies,
        snapshot.reply_rate(),
        snapshot.reply_timeouts
    );
    println!(
        "  错误: {} 次发送失败, {} 次读取失败",
        snapshot.send_failures, snapshot.receive_failures
    );
    println!(
        "  遥测: {} 行入站, {} 帧, {} 帧已转发",
        snapshot.inbound_lines, snapshot.telemetry_frames, snapshot.telemetry_forwarded
    );
}

/// 打印帮助信息
fn print_help() {
    println!("可用命令:");
    println!("  connect [host[:port]]         连接到 Hub（默认使用配置）");
    println!("  disconnect                    断开连接");
    println!("  status                        显示连接状态");
    println!("  w a s d                       前/左/后/右 提示");
    println!("  z x                           向左/向右转 提示");
    println!("  e q                           开始/停止 提示");
    println!("  cue <name>                    按名称发送提示");
    println!("  off                           立即关闭全部电机");
    println!("  send <motor> <on|off>         单个电机开关");
    println!("  raw <board;pin:value>         发送原始命令");
    println!("  pattern list                  列出图案");
    println!("  pattern show <name>           显示图案");
    println!("  pattern test <name>           播放图案");
    println!("  pattern save <name> <motors> [buzz_ms] [one|two]");
    println!("  pattern delete <name>         删除图案");
    println!("  pattern export [file]         导出图案库");
    println!("  listen [on|log|off]           遥测监听");
    println!("  metrics [reset]               链路指标");
    println!("  help                          显示帮助");
    println!("  exit                          退出");
}

fn print_help_hint(line: &str) {
    let command = line.split_whitespace().next().unwrap_or_default();
    match command {
        "send" | "raw" | "pattern" | "listen" => println!("💡 输入 'help' 查看 {} 的用法", command),
        _ => {},
    }
}
