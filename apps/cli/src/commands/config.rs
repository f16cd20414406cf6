//! 配置管理命令
//!
//! 配置文件位于 `<config_dir>/haptiband/config.toml`，所有字段可选，
//! 未设置的字段使用驱动默认值。

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use haptiband_driver::LinkConfig;
use haptiband_tools::{JsonFileStore, PATTERNS_FILE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 配置目录
pub fn config_dir() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;

    path.push("haptiband");
    Ok(path)
}

fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// CLI 配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Hub 地址
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Hub 端口
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// 最大连接尝试次数
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_timeout_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,

    /// 图案库文件
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns_file: Option<PathBuf>,
}

impl CliConfig {
    /// 加载默认位置的配置
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file()?)
    }

    /// 加载配置（文件不存在时返回默认配置）
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("解析配置文件失败: {}", path.display()))
    }

    /// 保存到默认位置
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_file()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("创建配置目录失败")?;
        }

        let body = toml::to_string_pretty(self).context("序列化配置失败")?;
        let content = format!("# HaptiBand CLI Configuration\n\n{}", body);
        fs::write(path, content).context("写入配置文件失败")?;

        Ok(())
    }

    /// 合并默认值后的链路配置
    pub fn link_config(&self) -> LinkConfig {
        let mut config = LinkConfig::default();

        if let Some(ref address) = self.address {
            config.address = address.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(retries) = self.max_retries {
            config.max_retries = retries;
        }
        if let Some(ms) = self.retry_delay_ms {
            config.retry_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.connect_timeout_ms {
            config.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.reply_timeout_ms {
            config.reply_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval = Duration::from_millis(ms);
        }

        config
    }

    /// 图案库路径（未配置时放在配置目录下）
    pub fn patterns_path(&self) -> Result<PathBuf> {
        match self.patterns_file {
            Some(ref path) => Ok(path.clone()),
            None => Ok(config_dir()?.join(PATTERNS_FILE)),
        }
    }

    pub fn pattern_store(&self) -> Result<JsonFileStore> {
        Ok(JsonFileStore::new(self.patterns_path()?))
    }

    /// 检查明显无效的取值
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.address.as_deref().is_some_and(|a| a.trim().is_empty()) {
            problems.push("address is empty".to_string());
        }
        if self.port == Some(0) {
            problems.push("port must not be 0".to_string());
        }
        if self.reply_timeout_ms == Some(0) {
            problems.push("reply_timeout_ms must be greater than 0".to_string());
        }
        if self.poll_interval_ms == Some(0) {
            problems.push("poll_interval_ms must be greater than 0".to_string());
        }

        problems
    }
}

/// `config set` 参数
#[derive(Args, Debug, Default)]
pub struct SetArgs {
    /// Hub 地址（如 192.168.4.1）
    #[arg(short, long)]
    pub address: Option<String>,

    /// Hub 端口
    #[arg(short, long)]
    pub port: Option<u16>,

    /// 最大连接尝试次数
    #[arg(long)]
    pub retries: Option<u32>,

    /// 重试间隔（毫秒）
    #[arg(long)]
    pub retry_delay_ms: Option<u64>,

    /// 连接超时（毫秒）
    #[arg(long)]
    pub connect_timeout_ms: Option<u64>,

    /// 回复超时（毫秒）
    #[arg(long)]
    pub reply_timeout_ms: Option<u64>,

    /// 遥测轮询间隔（毫秒）
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// 图案库文件
    #[arg(long)]
    pub patterns_file: Option<PathBuf>,
}

impl SetArgs {
    /// 写入配置，返回修改过的字段说明
    pub fn apply(self, config: &mut CliConfig) -> Vec<String> {
        let mut changed = Vec::new();

        if let Some(address) = self.address {
            changed.push(format!("address = {}", address));
            config.address = Some(address);
        }
        if let Some(port) = self.port {
            changed.push(format!("port = {}", port));
            config.port = Some(port);
        }
        if let Some(retries) = self.retries {
            changed.push(format!("max_retries = {}", retries));
            config.max_retries = Some(retries);
        }
        if let Some(ms) = self.retry_delay_ms {
            changed.push(format!("retry_delay_ms = {}", ms));
            config.retry_delay_ms = Some(ms);
        }
        if let Some(ms) = self.connect_timeout_ms {
            changed.push(format!("connect_timeout_ms = {}", ms));
            config.connect_timeout_ms = Some(ms);
        }
        if let Some(ms) = self.reply_timeout_ms {
            changed.push(format!("reply_timeout_ms = {}", ms));
            config.reply_timeout_ms = Some(ms);
        }
        if let Some(ms) = self.poll_interval_ms {
            changed.push(format!("poll_interval_ms = {}", ms));
            config.poll_interval_ms = Some(ms);
        }
        if let Some(path) = self.patterns_file {
            changed.push(format!("patterns_file = {}", path.display()));
            config.patterns_file = Some(path);
        }

        changed
    }
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 设置配置项
    Set(SetArgs),

    /// 获取配置项
    Get {
        /// 配置项名称
        #[arg(default_value = "all")]
        key: String,
    },

    /// 检查配置
    Check,
}

impl ConfigCommand {
    pub async fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Set(args) => Self::set_(args).await,

            ConfigCommand::Get { key } => Self::get_(key).await,

            ConfigCommand::Check => Self::check_().await,
        }
    }

    async fn set_(args: SetArgs) -> Result<()> {
        let mut config = CliConfig::load()?;

        let changed = args.apply(&mut config);
        if changed.is_empty() {
            println!("⚠️  没有指定任何配置项");
            return Ok(());
        }

        config.save()?;
        for item in changed {
            println!("✅ {}", item);
        }
        Ok(())
    }

    async fn get_(key: String) -> Result<()> {
        let config = CliConfig::load()?;
        let link = config.link_config();

        match key.as_str() {
            "address" => println!("{}", link.address),
            "port" => println!("{}", link.port),
            "max_retries" | "retries" => println!("{}", link.max_retries),
            "retry_delay_ms" => println!("{}", link.retry_delay.as_millis()),
            "connect_timeout_ms" => println!("{}", link.connect_timeout.as_millis()),
            "reply_timeout_ms" => println!("{}", link.reply_timeout.as_millis()),
            "poll_interval_ms" => println!("{}", link.poll_interval.as_millis()),
            "patterns_file" => println!("{}", config.patterns_path()?.display()),
            _ => print_link_config(&config, &link)?,
        }

        Ok(())
    }

    async fn check_() -> Result<()> {
        let config = CliConfig::load()?;
        let path = config_file()?;

        println!("配置文件: {}", path.display());
        print_link_config(&config, &config.link_config())?;

        let problems = config.problems();
        if problems.is_empty() {
            println!("✅ 配置有效");
        } else {
            for problem in &problems {
                println!("❌ {}", problem);
            }
            anyhow::bail!("配置中有 {} 个问题", problems.len());
        }

        Ok(())
    }
}

fn print_link_config(config: &CliConfig, link: &LinkConfig) -> Result<()> {
    println!("HaptiBand CLI 配置:");
    println!("  Hub:        {}", link.socket_label());
    println!("  最大尝试:   {}", link.max_retries);
    println!("  重试间隔:   {:?}", link.retry_delay);
    println!("  连接超时:   {:?}", link.connect_timeout);
    println!("  回复超时:   {:?}", link.reply_timeout);
    println!("  轮询间隔:   {:?}", link.poll_interval);
    println!("  图案库:     {}", config.patterns_path()?.display());
    Ok(())
}
