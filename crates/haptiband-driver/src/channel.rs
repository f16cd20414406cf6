//! 命令通道
//!
//! 一次事务 = 写出一行命令 + 在超时内尝试读取一次回复（最多 256 字节）。
//! 整个事务持有链路的 IO 锁。回复中夹带的遥测行只在有遥测线程附着时缓存，
//! 遥测线程自身转发时不缓存。

use crate::config::DEFAULT_REPLY_TIMEOUT;
use crate::error::DriverError;
use crate::link::HubLink;
use crate::metrics::LinkMetrics;
use haptiband_protocol::telemetry::is_telemetry;
use haptiband_protocol::{Command, REPLY_MAX_BYTES};
use std::fmt;
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, error, trace, warn};

/// Hub 回复（已去除首尾空白，可能为空）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply(String);

impl Reply {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl HubLink {
    /// 发送一条命令并尝试读取回复
    ///
    /// # 错误
    /// - `DriverError::NotConnected`: 链路已关闭或已失效（不会写出任何字节）
    /// - `DriverError::Send`: 写入失败，链路被标记为失效
    /// - `DriverError::Receive`: 对端关闭或读取失败，链路被标记为失效
    /// - `DriverError::Timeout`: 超时内没有回复（非致命）
    pub fn send(&self, command: &Command, timeout: Duration) -> Result<Reply, DriverError> {
        self.transact(command, timeout, self.is_listening())
    }

    /// 遥测线程的转发路径：回复中的遥测行不再入队
    pub(crate) fn forward(
        &self,
        command: &Command,
        timeout: Duration,
    ) -> Result<Reply, DriverError> {
        self.transact(command, timeout, false)
    }

    fn transact(
        &self,
        command: &Command,
        timeout: Duration,
        keep_telemetry: bool,
    ) -> Result<Reply, DriverError> {
        if !self.is_open() {
            return Err(DriverError::NotConnected);
        }

        let line = command.to_line();
        let deadline = Instant::now() + timeout;
        let metrics = self.metrics();

        let mut io = self.io();
        // 持锁后再确认一次，等待锁期间链路可能已被关闭
        if !self.is_open() {
            return Err(DriverError::NotConnected);
        }

        if let Err(e) = io.write_all(line.as_bytes(), deadline) {
            drop(io);
            LinkMetrics::incr(&metrics.send_failures);
            error!("Failed to send {:?}: {}", command.to_wire(), e);
            self.mark_stale(&e);
            return Err(DriverError::Send(e));
        }
        LinkMetrics::incr(&metrics.commands_sent);
        debug!("-> {}", command);

        let mut buf = [0u8; REPLY_MAX_BYTES];
        match io.read_once(&mut buf, deadline) {
            Ok(Some(0)) => {
                drop(io);
                LinkMetrics::incr(&metrics.receive_failures);
                let e = io::Error::new(io::ErrorKind::UnexpectedEof, "hub closed the connection");
                self.mark_stale(&e);
                Err(DriverError::Receive(e))
            },
            Ok(Some(n)) => {
                let text = String::from_utf8_lossy(&buf[..n]);
                for inbound in text.lines().map(str::trim).filter(|l| is_telemetry(l)) {
                    if keep_telemetry {
                        trace!("Telemetry in reply: {}", inbound);
                        io.push_backlog(inbound.to_string());
                    } else {
                        trace!("Discarding telemetry in reply: {}", inbound);
                    }
                }
                LinkMetrics::incr(&metrics.replies);

                let reply = Reply(text.trim().to_string());
                debug!("<- {:?}", reply.as_str());
                Ok(reply)
            },
            Ok(None) => {
                LinkMetrics::incr(&metrics.reply_timeouts);
                warn!("No reply to {} within {:?}", command, timeout);
                Err(DriverError::Timeout)
            },
            Err(e) => {
                drop(io);
                LinkMetrics::incr(&metrics.receive_failures);
                error!("Failed to read reply to {}: {}", command, e);
                self.mark_stale(&e);
                Err(DriverError::Receive(e))
            },
        }
    }
}

/// 绑定默认超时的命令通道
///
/// # Example
///
/// ```no_run
/// use haptiband_driver::{CommandChannel, ConnectionManager, LinkConfig};
/// use haptiband_protocol::{Command, MotorChannel, MotorState};
///
/// let manager = ConnectionManager::new(LinkConfig::default());
/// let link = manager.connect()?;
/// let channel = CommandChannel::new(link);
/// let reply = channel.send(&Command::set(MotorChannel::Front, MotorState::On))?;
/// println!("hub replied: {}", reply);
/// # Ok::<(), haptiband_driver::DriverError>(())
/// ```
#[derive(Debug, Clone)]
pub struct CommandChannel {
    link: HubLink,
    timeout: Duration,
}

impl CommandChannel {
    pub fn new(link: HubLink) -> Self {
        Self {
            link,
            timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn link(&self) -> &HubLink {
        &self.link
    }

    /// 使用通道默认超时发送
    pub fn send(&self, command: &Command) -> Result<Reply, DriverError> {
        self.link.send(command, self.timeout)
    }

    /// 使用指定超时发送
    pub fn send_with_timeout(
        &self,
        command: &Command,
        timeout: Duration,
    ) -> Result<Reply, DriverError> {
        self.link.send(command, timeout)
    }
}
