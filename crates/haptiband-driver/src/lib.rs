//! # HaptiBand Driver
//!
//! Hub 链路的 IO 层：
//! - 连接管理（带重试的建连、显式断开、状态查询）
//! - 命令通道（写一行命令 + 有界超时读取回复）
//! - 遥测轮询（后台线程，解析后在同一链路上转发）
//!
//! # 并发模型
//!
//! 每条 `HubLink` 内部只有一把 IO 锁，命令事务和遥测排空都在锁内完成；
//! 遥测线程等待就绪时不持锁。断开通过锁外的 socket 句柄完成，
//! 阻塞在该链路上的任务会立即失败。
//!
//! 大多数用户应该使用 `haptiband-client` 提供的序列调度接口。

pub mod channel;
pub mod config;
pub mod dialer;
mod error;
pub mod link;
pub mod manager;
pub mod metrics;
pub mod poller;
pub mod state;

pub use channel::{CommandChannel, Reply};
pub use config::{LinkConfig, SEQUENCE_REPLY_TIMEOUT};
pub use dialer::{Dialer, TcpDialer};
pub use error::DriverError;
pub use link::HubLink;
pub use manager::ConnectionManager;
pub use metrics::{LinkMetrics, MetricsSnapshot};
pub use poller::{TelemetryMode, TelemetryPoller};
pub use state::{AtomicConnectionState, ConnectionState};
