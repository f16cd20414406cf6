//! 遥测轮询线程
//!
//! 在锁外等待 socket 可读（最长一个轮询间隔），随后持 IO 锁非阻塞地排空数据，
//! 释放锁后逐行处理：遥测帧转换为命令并在同一链路上转发，其余行仅记录日志。

use crate::config::LinkConfig;
use crate::error::DriverError;
use crate::link::HubLink;
use crate::metrics::LinkMetrics;
use crossbeam_channel::{Receiver, Sender};
use haptiband_protocol::TelemetryFrame;
use mio::net::TcpStream as MioStream;
use mio::{Events, Interest, Poll, Token};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const SOURCE_TOKEN: Token = Token(0);

/// 入站行通道容量（满时丢弃新行）
const INBOUND_CAPACITY: usize = 256;

/// 遥测处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TelemetryMode {
    /// 解析并转发到头带
    #[default]
    Forward,
    /// 只记录日志，不转发
    LogOnly,
}

/// 后台遥测轮询器
///
/// Drop 时停止并等待线程退出（最长约一个轮询间隔）。
pub struct TelemetryPoller {
    link: HubLink,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    lines: Receiver<String>,
}

struct PollerTask {
    link: HubLink,
    poll: Poll,
    source: MioStream,
    stop: Arc<AtomicBool>,
    tx: Sender<String>,
    mode: TelemetryMode,
    interval: Duration,
    reply_timeout: Duration,
}

impl TelemetryPoller {
    /// 在链路上启动遥测线程
    pub fn spawn(
        link: HubLink,
        config: &LinkConfig,
        mode: TelemetryMode,
    ) -> Result<Self, DriverError> {
        if !link.is_open() {
            return Err(DriverError::NotConnected);
        }

        let mut source = link.readiness_source().map_err(DriverError::Receive)?;
        let poll = Poll::new().map_err(DriverError::Receive)?;
        poll.registry()
            .register(&mut source, SOURCE_TOKEN, Interest::READABLE)
            .map_err(DriverError::Receive)?;

        let stop = Arc::new(AtomicBool::new(false));
        let (tx, lines) = crossbeam_channel::bounded(INBOUND_CAPACITY);
        let link_flag = link.clone();
        link_flag.io().clear_backlog();

        let task = PollerTask {
            link,
            poll,
            source,
            stop: Arc::clone(&stop),
            tx,
            mode,
            interval: config.poll_interval,
            reply_timeout: config.reply_timeout,
        };

        let handle = thread::Builder::new()
            .name("haptiband-telemetry".into())
            .spawn(move || task.run())
            .map_err(|source| DriverError::Spawn {
                name: "telemetry",
                source,
            })?;
        link_flag.set_listening(true);

        Ok(Self {
            link: link_flag,
            stop,
            handle: Some(handle),
            lines,
        })
    }

    /// 入站行（每行已去除首尾空白）
    pub fn lines(&self) -> &Receiver<String> {
        &self.lines
    }

    /// 线程是否仍在运行
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// 停止线程并等待退出
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Telemetry thread panicked");
            }
        }
        // 没有消费者后不再积压回复中的遥测
        self.link.set_listening(false);
        self.link.io().clear_backlog();
    }
}

impl Drop for TelemetryPoller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl PollerTask {
    fn run(mut self) {
        info!(
            "Telemetry poller started on link #{} ({:?})",
            self.link.id(),
            self.mode
        );
        let mut events = Events::with_capacity(4);

        while !self.stop.load(Ordering::Acquire) && self.link.is_open() {
            if let Err(e) = self.poll.poll(&mut events, Some(self.interval)) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                error!("Telemetry poll failed: {}", e);
                break;
            }

            // 即使没有事件也排空一次：回复中夹带的遥测行在 backlog 中
            let drained = self.link.io().drain_lines();
            for line in &drained.lines {
                self.handle_line(line);
            }

            if drained.closed {
                self.link.mark_stale(&"hub closed the connection");
                break;
            }
        }

        let _ = self.poll.registry().deregister(&mut self.source);
        info!("Telemetry poller on link #{} stopped", self.link.id());
    }

    fn handle_line(&self, line: &str) {
        let metrics = self.link.metrics();
        LinkMetrics::incr(&metrics.inbound_lines);
        let _ = self.tx.try_send(line.to_string());

        let frame = match TelemetryFrame::parse(line) {
            Ok(frame) => frame,
            Err(_) => {
                debug!("Hub: {}", line);
                return;
            },
        };
        LinkMetrics::incr(&metrics.telemetry_frames);

        if self.mode == TelemetryMode::LogOnly {
            info!("Telemetry: gps={} imu={}", frame.gps, frame.imu);
            return;
        }

        let command = match frame.to_command() {
            Ok(command) => command,
            Err(e) => {
                warn!("Dropping telemetry frame {:?}: {}", line, e);
                return;
            },
        };

        match self.link.forward(&command, self.reply_timeout) {
            Ok(_) | Err(DriverError::Timeout) => {
                LinkMetrics::incr(&metrics.telemetry_forwarded);
                debug!("Forwarded telemetry as {}", command);
            },
            Err(e) => warn!("Failed to forward telemetry: {}", e),
        }
    }
}
