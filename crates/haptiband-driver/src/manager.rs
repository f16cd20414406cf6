//! 连接管理器
//!
//! 负责建立、持有和关闭唯一的 Hub 链路。

use crate::config::LinkConfig;
use crate::dialer::{Dialer, TcpDialer};
use crate::error::DriverError;
use crate::link::HubLink;
use crate::metrics::LinkMetrics;
use crate::state::{AtomicConnectionState, ConnectionState};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use tracing::{error, info, warn};

/// 连接管理器
///
/// 同一时刻最多持有一条活动链路；重新连接会先关闭旧链路。
///
/// # Example
///
/// ```no_run
/// use haptiband_driver::{ConnectionManager, ConnectionState, LinkConfig};
///
/// let manager = ConnectionManager::new(LinkConfig::new("192.168.4.1", 80));
/// let link = manager.connect()?;
/// assert_eq!(manager.state(), ConnectionState::Connected);
///
/// manager.disconnect();
/// assert!(!link.is_open());
/// # Ok::<(), haptiband_driver::DriverError>(())
/// ```
pub struct ConnectionManager<D: Dialer = TcpDialer> {
    config: LinkConfig,
    dialer: D,
    state: AtomicConnectionState,
    current: Mutex<Option<HubLink>>,
    metrics: Arc<LinkMetrics>,
}

impl ConnectionManager<TcpDialer> {
    pub fn new(config: LinkConfig) -> Self {
        Self::with_dialer(config, TcpDialer)
    }
}

impl<D: Dialer> ConnectionManager<D> {
    /// 使用自定义拨号器创建
    pub fn with_dialer(config: LinkConfig, dialer: D) -> Self {
        Self {
            config,
            dialer,
            state: AtomicConnectionState::default(),
            current: Mutex::new(None),
            metrics: Arc::new(LinkMetrics::new()),
        }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// 替换配置（下一次 `connect` 生效）
    pub fn set_config(&mut self, config: LinkConfig) {
        self.config = config;
    }

    pub fn metrics(&self) -> &Arc<LinkMetrics> {
        &self.metrics
    }

    /// 建立连接（带重试）
    ///
    /// 每次尝试失败后等待 `retry_delay` 再重试，最后一次失败后不再等待。
    ///
    /// # 错误
    /// - `DriverError::ConnectFailed`: 所有尝试均失败，携带最后一次的原因
    pub fn connect(&self) -> Result<HubLink, DriverError> {
        let mut current = self.current.lock();
        if let Some(previous) = current.take() {
            previous.close();
        }
        self.state.set(ConnectionState::Connecting);

        let config = &self.config;
        let attempts = config.attempts();
        let target = config.socket_label();
        let mut attempt = 0;

        loop {
            attempt += 1;
            LinkMetrics::incr(&self.metrics.connect_attempts);

            let result = self
                .dialer
                .dial(&config.address, config.port, config.connect_timeout)
                .and_then(|stream| HubLink::open(stream, Arc::clone(&self.metrics)));

            match result {
                Ok(link) => {
                    info!(
                        "Connected to {} (link #{}, attempt {}/{})",
                        target,
                        link.id(),
                        attempt,
                        attempts
                    );
                    *current = Some(link.clone());
                    self.state.set(ConnectionState::Connected);
                    return Ok(link);
                },
                Err(e) => {
                    LinkMetrics::incr(&self.metrics.connect_failures);
                    if attempt >= attempts {
                        error!(
                            "Failed to connect to {} after {} attempt(s): {}",
                            target, attempt, e
                        );
                        self.state.set(ConnectionState::Disconnected);
                        return Err(DriverError::ConnectFailed {
                            attempts: attempt,
                            source: e,
                        });
                    }

                    warn!(
                        "Connect attempt {}/{} to {} failed: {}. Retrying in {:?}...",
                        attempt, attempts, target, e, config.retry_delay
                    );
                    thread::sleep(config.retry_delay);
                },
            }
        }
    }

    /// 断开连接（幂等）
    pub fn disconnect(&self) {
        if let Some(link) = self.current.lock().take() {
            link.close();
        }
        self.state.set(ConnectionState::Disconnected);
    }

    /// 当前状态
    ///
    /// 链路因发送/读取失败而失效时，状态自动回到 `Disconnected`。
    pub fn state(&self) -> ConnectionState {
        let state = self.state.get();
        if state.is_connected() && self.link().is_none() {
            self.state
                .compare_exchange(ConnectionState::Connected, ConnectionState::Disconnected);
            return ConnectionState::Disconnected;
        }
        state
    }

    /// 当前可用的链路
    pub fn link(&self) -> Option<HubLink> {
        self.current.lock().as_ref().filter(|link| link.is_open()).cloned()
    }

    /// 当前可用的链路，没有时返回 `NotConnected`
    pub fn require_link(&self) -> Result<HubLink, DriverError> {
        self.link().ok_or(DriverError::NotConnected)
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }
}

impl<D: Dialer> Drop for ConnectionManager<D> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
