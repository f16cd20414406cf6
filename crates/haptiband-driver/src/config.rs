//! 链路配置

use haptiband_protocol::{DEFAULT_HUB_ADDRESS, DEFAULT_HUB_PORT};
use std::time::Duration;

/// 默认连接重试次数
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// 默认重试间隔
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// 默认单次连接超时
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// 默认回复等待超时
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(1);

/// 序列执行时的回复等待超时
pub const SEQUENCE_REPLY_TIMEOUT: Duration = Duration::from_millis(500);

/// 默认遥测轮询间隔
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 链路配置
///
/// # Example
///
/// ```
/// use haptiband_driver::LinkConfig;
/// use std::time::Duration;
///
/// // 默认配置（192.168.4.1:80，重试 3 次，间隔 500ms）
/// let config = LinkConfig::default();
///
/// // 链式修改
/// let config = LinkConfig::new("10.0.0.7", 8080)
///     .max_retries(5)
///     .retry_delay(Duration::from_millis(200));
/// assert_eq!(config.socket_label(), "10.0.0.7:8080");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Hub 地址（IP 或主机名）
    pub address: String,
    /// Hub 端口
    pub port: u16,
    /// 最大连接尝试次数（0 视为 1）
    pub max_retries: u32,
    /// 两次尝试之间的等待时间
    pub retry_delay: Duration,
    /// 单次连接超时
    pub connect_timeout: Duration,
    /// 回复等待超时
    pub reply_timeout: Duration,
    /// 遥测轮询间隔
    pub poll_interval: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_HUB_ADDRESS.to_string(),
            port: DEFAULT_HUB_PORT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl LinkConfig {
    /// 指定地址和端口，其余使用默认值
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            ..Self::default()
        }
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn reply_timeout(mut self, reply_timeout: Duration) -> Self {
        self.reply_timeout = reply_timeout;
        self
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// 实际尝试次数（至少一次）
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// `address:port` 形式（日志用）
    pub fn socket_label(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}
