//! 序列调度测试

mod common;

use common::FakeHub;
use haptiband_client::{ClientError, Cue, Pattern, SequenceScheduler, generate};
use haptiband_driver::{ConnectionManager, DriverError, TelemetryMode, TelemetryPoller};
use haptiband_protocol::MotorChannel;
use serial_test::serial;
use std::collections::HashSet;
use std::thread;
use std::time::{Duration, Instant};

fn pattern(motors: &[MotorChannel]) -> Pattern {
    Pattern::new("test", motors, Duration::from_millis(10), true)
}

#[test]
#[serial]
fn test_run_sends_every_step_in_order() {
    let hub = FakeHub::start(Some("ok\n"));
    let manager = ConnectionManager::new(hub.config());
    let scheduler = SequenceScheduler::new(manager.connect().unwrap());

    let sequence = Cue::Forward.sequence();
    let report = scheduler.run(&sequence).unwrap();

    assert_eq!(report.steps_sent, 4);
    assert_eq!(report.replies, 4);
    assert_eq!(report.timeouts, 0);
    // 100 + 50 + 100 ms
    assert!(report.elapsed >= Duration::from_millis(250));
    assert_eq!(hub.received(), sequence.wire_lines());
}

/// 回复超时不中断序列
#[test]
#[serial]
fn test_timeouts_are_not_fatal() {
    let hub = FakeHub::start(None);
    let manager = ConnectionManager::new(hub.config());
    let scheduler = SequenceScheduler::new(manager.connect().unwrap())
        .with_reply_timeout(Duration::from_millis(20));

    let sequence = generate(&pattern(&[MotorChannel::Left, MotorChannel::Right])).unwrap();
    let report = scheduler.run(&sequence).unwrap();

    assert_eq!(report.steps_sent, 8);
    assert_eq!(report.timeouts, 8);
    assert_eq!(hub.wait_for_lines(8, Duration::from_secs(1)).len(), 8);
}

#[test]
fn test_run_on_closed_link_aborts() {
    let hub = FakeHub::start(Some("ok\n"));
    let manager = ConnectionManager::new(hub.config());
    let scheduler = SequenceScheduler::new(manager.connect().unwrap());
    manager.disconnect();

    let result = scheduler.run(&Cue::Stop.sequence());
    assert!(matches!(
        result,
        Err(ClientError::Driver(DriverError::NotConnected))
    ));

    thread::sleep(Duration::from_millis(50));
    assert!(hub.received().is_empty());
}

/// 同一链路上的两个序列不交错
#[test]
#[serial]
fn test_concurrent_sequences_do_not_interleave() {
    let hub = FakeHub::start(Some("ok\n"));
    let manager = ConnectionManager::new(hub.config());
    let scheduler = SequenceScheduler::new(manager.connect().unwrap());

    let first = generate(&pattern(&[MotorChannel::Left, MotorChannel::Front])).unwrap();
    let second = generate(&pattern(&[MotorChannel::Right, MotorChannel::Back])).unwrap();

    let a = scheduler.spawn(first.clone()).unwrap();
    let b = scheduler.spawn(second.clone()).unwrap();
    a.join().unwrap().unwrap();
    b.join().unwrap().unwrap();

    let received = hub.wait_for_lines(16, Duration::from_secs(2));
    assert_eq!(received.len(), 16);

    let first_lines: HashSet<String> = first.wire_lines().into_iter().collect();
    let (head, tail) = received.split_at(8);
    let head_is_first = first_lines.contains(&head[0]);
    let (expected_head, expected_tail) = if head_is_first {
        (first.wire_lines(), second.wire_lines())
    } else {
        (second.wire_lines(), first.wire_lines())
    };
    assert_eq!(head, expected_head.as_slice());
    assert_eq!(tail, expected_tail.as_slice());
}

/// 链路中途断开时序列中止
#[test]
#[serial]
fn test_disconnect_mid_run_aborts() {
    let hub = FakeHub::start(Some("ok\n"));
    let manager = ConnectionManager::new(hub.config());
    let scheduler = SequenceScheduler::new(manager.connect().unwrap());

    // 每步后等待 100ms，足够在中途断开
    let slow = Pattern::new("slow", &[MotorChannel::Back], Duration::from_millis(100), true);
    let handle = scheduler.spawn(generate(&slow).unwrap()).unwrap();

    hub.wait_for_lines(1, Duration::from_secs(1));
    manager.disconnect();

    let result = handle.join().unwrap();
    assert!(result.unwrap_err().is_disconnect());
    assert!(hub.received().len() < 4);
}

/// 遥测线程空闲时不占用链路，序列按原节奏连续发出
#[test]
#[serial]
fn test_run_alongside_idle_poller() {
    let hub = FakeHub::start(Some("ok\n"));
    let config = hub.config().poll_interval(Duration::from_millis(500));
    let manager = ConnectionManager::new(config);
    let link = manager.connect().unwrap();
    let poller =
        TelemetryPoller::spawn(link.clone(), manager.config(), TelemetryMode::Forward).unwrap();
    thread::sleep(Duration::from_millis(50));

    let sequence = Cue::Forward.sequence();
    let started = Instant::now();
    let report = SequenceScheduler::new(link).run(&sequence).unwrap();

    assert_eq!(report.steps_sent, 4);
    assert!(
        started.elapsed() < Duration::from_millis(650),
        "sequence took {:?}",
        started.elapsed()
    );
    assert_eq!(hub.wait_for_lines(4, Duration::from_secs(1)), sequence.wire_lines());
    poller.stop();
}
