//! 连接管理测试
//!
//! 覆盖重试计数、状态转换、重连与断开。

mod common;

use common::FakeHub;
use haptiband_driver::{ConnectionManager, ConnectionState, Dialer, DriverError, TcpDialer};
use std::io;
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// 前 `failures` 次尝试失败，之后正常连接
struct FlakyDialer {
    failures: u32,
    attempts: AtomicU32,
}

impl FlakyDialer {
    fn new(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            failures,
            attempts: AtomicU32::new(0),
        })
    }

    fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Dialer for FlakyDialer {
    fn dial(&self, address: &str, port: u16, timeout: Duration) -> io::Result<TcpStream> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("simulated failure #{}", attempt),
            ));
        }
        TcpDialer.dial(address, port, timeout)
    }
}

#[test]
fn test_connect_and_disconnect() {
    let hub = FakeHub::replying_ok();
    let manager = ConnectionManager::new(hub.config());

    let link = manager.connect().unwrap();
    assert!(link.is_open());
    assert_eq!(manager.state(), ConnectionState::Connected);
    assert!(manager.link().unwrap().same_link(&link));

    manager.disconnect();
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(!link.is_open());

    // 幂等
    manager.disconnect();
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

/// k 次失败后成功（k < maxRetries）→ 恰好 k+1 次尝试
#[test]
fn test_retry_until_success() {
    let hub = FakeHub::replying_ok();
    let dialer = FlakyDialer::new(2);
    let manager = ConnectionManager::with_dialer(hub.config().max_retries(3), Arc::clone(&dialer));

    manager.connect().unwrap();
    assert_eq!(dialer.attempts(), 3);
    assert_eq!(manager.state(), ConnectionState::Connected);

    let snapshot = manager.metrics().snapshot();
    assert_eq!(snapshot.connect_attempts, 3);
    assert_eq!(snapshot.connect_failures, 2);
}

/// maxRetries 次全部失败 → ConnectFailed，恰好 maxRetries 次尝试
#[test]
fn test_retries_exhausted() {
    let hub = FakeHub::replying_ok();
    let dialer = FlakyDialer::new(u32::MAX);
    let manager = ConnectionManager::with_dialer(hub.config().max_retries(3), Arc::clone(&dialer));

    let err = manager.connect().unwrap_err();
    match err {
        DriverError::ConnectFailed { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(source.to_string().contains("#3"), "last cause: {}", source);
        },
        other => panic!("Expected ConnectFailed, got {:?}", other),
    }
    assert_eq!(dialer.attempts(), 3);
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[test]
fn test_zero_retries_makes_one_attempt() {
    let hub = FakeHub::replying_ok();
    let dialer = FlakyDialer::new(u32::MAX);
    let manager = ConnectionManager::with_dialer(hub.config().max_retries(0), Arc::clone(&dialer));

    assert!(manager.connect().is_err());
    assert_eq!(dialer.attempts(), 1);
}

/// 最后一次失败后不再等待重试间隔
#[test]
fn test_no_delay_after_final_failure() {
    let hub = FakeHub::replying_ok();
    let dialer = FlakyDialer::new(u32::MAX);
    let config = hub
        .config()
        .max_retries(2)
        .retry_delay(Duration::from_millis(300));
    let manager = ConnectionManager::with_dialer(config, dialer);

    let start = Instant::now();
    assert!(manager.connect().is_err());
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(300), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(550), "elapsed {:?}", elapsed);
}

#[test]
fn test_connect_refused_by_real_socket() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = haptiband_driver::LinkConfig::new("127.0.0.1", port)
        .max_retries(2)
        .retry_delay(Duration::from_millis(5));
    let manager = ConnectionManager::new(config);

    assert!(matches!(
        manager.connect(),
        Err(DriverError::ConnectFailed { attempts: 2, .. })
    ));
}

/// 重新连接会先关闭旧链路
#[test]
fn test_reconnect_closes_previous_link() {
    let hub = FakeHub::replying_ok();
    let manager = ConnectionManager::new(hub.config());

    let first = manager.connect().unwrap();
    let second = manager.connect().unwrap();

    assert!(!first.is_open());
    assert!(second.is_open());
    assert!(!first.same_link(&second));
    assert!(manager.link().unwrap().same_link(&second));
    assert_eq!(hub.accepted(), 2);
}

/// 链路失效后状态回到 Disconnected
#[test]
fn test_state_follows_stale_link() {
    let hub = FakeHub::replying_ok();
    let manager = ConnectionManager::new(hub.config());

    let link = manager.connect().unwrap();
    link.close();

    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(matches!(manager.require_link(), Err(DriverError::NotConnected)));
}
