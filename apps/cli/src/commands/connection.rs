//! 连接参数
//!
//! 命令行参数优先于配置文件，配置文件优先于驱动默认值。

use super::config::CliConfig;
use anyhow::{Context, Result};
use clap::Args;
use haptiband_driver::LinkConfig;

/// 连接相关的公共参数
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectArgs {
    /// Hub 地址（覆盖配置文件）
    #[arg(short, long)]
    pub address: Option<String>,

    /// Hub 端口（覆盖配置文件）
    #[arg(short, long)]
    pub port: Option<u16>,

    /// 最大连接尝试次数（覆盖配置文件）
    #[arg(long)]
    pub retries: Option<u32>,
}

impl ConnectArgs {
    /// 合并配置文件后的链路配置
    pub fn resolve(&self, config: &CliConfig) -> LinkConfig {
        let mut link = config.link_config();

        if let Some(ref address) = self.address {
            link.address = address.clone();
        }
        if let Some(port) = self.port {
            link.port = port;
        }
        if let Some(retries) = self.retries {
            link.max_retries = retries;
        }

        link
    }
}

/// 解析 `host` 或 `host:port`
pub fn parse_target(target: &str) -> Result<(String, Option<u16>)> {
    let target = target.trim();
    if target.is_empty() {
        anyhow::bail!("地址不能为空");
    }

    match target.rsplit_once(':') {
        Some((host, port)) => {
            if host.is_empty() {
                anyhow::bail!("地址不能为空");
            }
            let port = port
                .parse::<u16>()
                .with_context(|| format!("无效的端口: {:?}", port))?;
            Ok((host.to_string(), Some(port)))
        },
        None => Ok((target.to_string(), None)),
    }
}
