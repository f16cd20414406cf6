//! Hub 链路（一个已建立的 TCP 会话）
//!
//! 所有 socket 读写都经过 `LinkIo` 的互斥锁，任一时刻只有一个任务处于事务中。
//! socket 为非阻塞模式，所有等待都通过 `mio::Poll` 完成并受截止时间约束。
//!
//! 关闭链路时通过锁外的 `closer` 句柄执行 `shutdown(Both)`，
//! 正在等待的读写会立即被唤醒并失败，而不需要先获取锁。

use crate::metrics::LinkMetrics;
use mio::net::TcpStream as MioStream;
use mio::{Events, Interest, Poll, Token};
use parking_lot::{Mutex, MutexGuard};
use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

const LINK_TOKEN: Token = Token(0);

/// 单次非阻塞读取的缓冲区大小（遥测排空）
const DRAIN_CHUNK: usize = 1024;

/// 回复中夹带的遥测行最多缓存的条数（满时丢弃最旧的）
pub(crate) const BACKLOG_CAPACITY: usize = 64;

static NEXT_LINK_ID: AtomicU64 = AtomicU64::new(1);

/// Hub 链路句柄
///
/// 可廉价克隆，所有克隆共享同一个 socket。
#[derive(Clone)]
pub struct HubLink {
    shared: Arc<LinkShared>,
}

struct LinkShared {
    id: u64,
    peer: SocketAddr,
    io: Mutex<LinkIo>,
    /// 序列闸门：同一链路上的序列依次执行
    sequence_gate: Mutex<()>,
    /// 锁外关闭用的句柄（与 `io.stream` 共享同一个 socket）
    closer: TcpStream,
    open: AtomicBool,
    /// 是否有遥测线程在处理入站行
    listening: AtomicBool,
    metrics: Arc<LinkMetrics>,
}

/// 受互斥锁保护的 IO 状态
pub(crate) struct LinkIo {
    stream: MioStream,
    poll: Poll,
    events: Events,
    /// 回复中夹带的遥测行，等待遥测线程处理
    backlog: VecDeque<String>,
    /// 尚未遇到换行符的入站字节
    partial: Vec<u8>,
}

/// 一次排空的结果
#[derive(Debug, Default)]
pub(crate) struct Drained {
    pub lines: Vec<String>,
    /// 对端已关闭或读取出错
    pub closed: bool,
}

impl HubLink {
    /// 包装一个已连接的 socket
    pub(crate) fn open(stream: TcpStream, metrics: Arc<LinkMetrics>) -> io::Result<Self> {
        let peer = stream.peer_addr()?;
        stream.set_nonblocking(true)?;
        let closer = stream.try_clone()?;

        let mut stream = MioStream::from_std(stream);
        let poll = Poll::new()?;
        poll.registry().register(
            &mut stream,
            LINK_TOKEN,
            Interest::READABLE | Interest::WRITABLE,
        )?;

        Ok(Self {
            shared: Arc::new(LinkShared {
                id: NEXT_LINK_ID.fetch_add(1, Ordering::Relaxed),
                peer,
                io: Mutex::new(LinkIo {
                    stream,
                    poll,
                    events: Events::with_capacity(8),
                    backlog: VecDeque::new(),
                    partial: Vec::new(),
                }),
                sequence_gate: Mutex::new(()),
                closer,
                open: AtomicBool::new(true),
                listening: AtomicBool::new(false),
                metrics,
            }),
        })
    }

    /// 链路编号（进程内唯一）
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.shared.peer
    }

    /// 链路是否可用（未关闭且未失效）
    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::Acquire)
    }

    /// 是否有遥测线程附着在此链路上
    ///
    /// 没有时，回复中夹带的遥测行被直接丢弃。
    pub fn is_listening(&self) -> bool {
        self.shared.listening.load(Ordering::Acquire)
    }

    pub(crate) fn set_listening(&self, listening: bool) {
        self.shared.listening.store(listening, Ordering::Release);
    }

    pub fn metrics(&self) -> &Arc<LinkMetrics> {
        &self.shared.metrics
    }

    /// 关闭链路（幂等）
    ///
    /// 返回本次调用是否实际执行了关闭。
    pub fn close(&self) -> bool {
        if !self.shared.open.swap(false, Ordering::AcqRel) {
            return false;
        }

        info!("Link #{} to {} closed", self.shared.id, self.shared.peer);
        self.shutdown_socket();
        true
    }

    /// 标记链路失效（发送/读取失败后调用）
    pub(crate) fn mark_stale(&self, reason: &dyn fmt::Display) {
        if self.shared.open.swap(false, Ordering::AcqRel) {
            warn!(
                "Link #{} to {} marked stale: {}",
                self.shared.id, self.shared.peer, reason
            );
            self.shutdown_socket();
        }
    }

    fn shutdown_socket(&self) {
        match self.shared.closer.shutdown(Shutdown::Both) {
            Err(e) if e.kind() != io::ErrorKind::NotConnected => {
                debug!("Shutdown of link #{} failed: {}", self.shared.id, e);
            },
            _ => {},
        }
    }

    /// 获取序列闸门
    ///
    /// 持有期间其他序列无法在此链路上执行。
    pub fn sequence_guard(&self) -> MutexGuard<'_, ()> {
        self.shared.sequence_gate.lock()
    }

    /// 获取 IO 锁
    pub(crate) fn io(&self) -> MutexGuard<'_, LinkIo> {
        self.shared.io.lock()
    }

    /// 创建一个只用于就绪通知的 socket 句柄（遥测线程在锁外等待）
    pub(crate) fn readiness_source(&self) -> io::Result<MioStream> {
        Ok(MioStream::from_std(self.shared.closer.try_clone()?))
    }

    /// 两个句柄是否指向同一条链路
    pub fn same_link(&self, other: &HubLink) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl fmt::Debug for HubLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubLink")
            .field("id", &self.shared.id)
            .field("peer", &self.shared.peer)
            .field("open", &self.is_open())
            .finish()
    }
}

impl LinkIo {
    /// 等待任意就绪事件
    ///
    /// 返回 `false` 表示截止时间已到且没有事件。
    fn wait_ready(&mut self, deadline: Instant) -> io::Result<bool> {
        loop {
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }

            match self.poll.poll(&mut self.events, Some(deadline - now)) {
                Ok(()) if self.events.is_empty() => continue,
                Ok(()) => return Ok(true),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// 在截止时间前写完全部字节
    ///
    /// 超时以 `TimedOut` 错误返回（部分写入后链路不可再用）。
    pub(crate) fn write_all(&mut self, mut bytes: &[u8], deadline: Instant) -> io::Result<()> {
        while !bytes.is_empty() {
            match self.stream.write(bytes) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => bytes = &bytes[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {},
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if !self.wait_ready(deadline)? {
                        return Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            "socket not writable before deadline",
                        ));
                    }
                },
                Err(e) => return Err(e),
            }
        }

        self.stream.flush()
    }

    /// 在截止时间前读取一次
    ///
    /// - `Ok(Some(0))`: 对端已关闭
    /// - `Ok(Some(n))`: 读到 n 字节
    /// - `Ok(None)`: 超时
    pub(crate) fn read_once(&mut self, buf: &mut [u8], deadline: Instant) -> io::Result<Option<usize>> {
        loop {
            match self.stream.read(buf) {
                Ok(n) => return Ok(Some(n)),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {},
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if !self.wait_ready(deadline)? {
                        return Ok(None);
                    }
                },
                Err(e) => return Err(e),
            }
        }
    }

    /// 缓存回复中夹带的入站行
    pub(crate) fn push_backlog(&mut self, line: String) {
        if self.backlog.len() >= BACKLOG_CAPACITY {
            self.backlog.pop_front();
        }
        self.backlog.push_back(line);
    }

    pub(crate) fn clear_backlog(&mut self) {
        self.backlog.clear();
    }

    pub(crate) fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// 非阻塞地排空 socket，返回所有完整的行（含之前缓存的行）
    pub(crate) fn drain_lines(&mut self) -> Drained {
        let mut drained = Drained {
            lines: self.backlog.drain(..).collect(),
            closed: false,
        };

        let mut chunk = [0u8; DRAIN_CHUNK];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    drained.closed = true;
                    break;
                },
                Ok(n) => self.partial.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {},
                Err(e) => {
                    warn!("Telemetry read failed: {}", e);
                    drained.closed = true;
                    break;
                },
            }
        }

        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.partial.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw).trim().to_string();
            if !line.is_empty() {
                drained.lines.push(line);
            }
        }

        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::time::Duration;

    fn pair() -> (HubLink, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();
        let link = HubLink::open(client, Arc::new(LinkMetrics::new())).unwrap();
        (link, server)
    }

    #[test]
    fn test_close_is_idempotent() {
        let (link, _server) = pair();
        assert!(link.is_open());
        assert!(link.close());
        assert!(!link.is_open());
        assert!(!link.close());
    }

    #[test]
    fn test_clones_share_state() {
        let (link, _server) = pair();
        let other = link.clone();
        assert!(other.same_link(&link));
        other.close();
        assert!(!link.is_open());
    }

    #[test]
    fn test_drain_splits_lines_and_keeps_partial() {
        let (link, mut server) = pair();
        server.write_all(b"GPS:1|IMU:2\r\nhello\nGPS:3").unwrap();
        server.flush().unwrap();
        std::thread::sleep(Duration::from_millis(50));

        let drained = link.io().drain_lines();
        assert_eq!(drained.lines, vec!["GPS:1|IMU:2".to_string(), "hello".to_string()]);
        assert!(!drained.closed);

        server.write_all(b"|IMU:4\n").unwrap();
        std::thread::sleep(Duration::from_millis(50));
        let drained = link.io().drain_lines();
        assert_eq!(drained.lines, vec!["GPS:3|IMU:4".to_string()]);
    }

    #[test]
    fn test_drain_reports_peer_close() {
        let (link, server) = pair();
        drop(server);
        std::thread::sleep(Duration::from_millis(50));
        assert!(link.io().drain_lines().closed);
    }

    #[test]
    fn test_backlog_is_bounded() {
        let (link, _server) = pair();
        let mut io = link.io();
        for i in 0..BACKLOG_CAPACITY + 10 {
            io.push_backlog(format!("GPS:{}|IMU:0", i));
        }
        assert_eq!(io.backlog_len(), BACKLOG_CAPACITY);

        let drained = io.drain_lines();
        assert_eq!(drained.lines.first().map(String::as_str), Some("GPS:10|IMU:0"));
        assert_eq!(io.backlog_len(), 0);
    }

    #[test]
    fn test_listening_flag() {
        let (link, _server) = pair();
        assert!(!link.is_listening());
        link.set_listening(true);
        assert!(link.clone().is_listening());
        link.set_listening(false);
        assert!(!link.is_listening());
    }

    #[test]
    fn test_read_once_times_out() {
        let (link, _server) = pair();
        let mut buf = [0u8; 16];
        let deadline = Instant::now() + Duration::from_millis(50);
        assert_eq!(link.io().read_once(&mut buf, deadline).unwrap(), None);
    }
}
