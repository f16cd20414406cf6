//! 链路指标
//!
//! 原子计数器，可在任意线程读取，不引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 链路实时指标
///
/// 由 `ConnectionManager` 创建并在其所有链路间共享（会话级计数）。
#[derive(Debug, Default)]
pub struct LinkMetrics {
    /// 连接尝试次数
    pub connect_attempts: AtomicU64,
    /// 连接失败次数（单次尝试）
    pub connect_failures: AtomicU64,
    /// 成功写出的命令数
    pub commands_sent: AtomicU64,
    /// 收到的回复数（含空回复）
    pub replies: AtomicU64,
    /// 回复等待超时次数（非致命）
    pub reply_timeouts: AtomicU64,
    /// 写入失败次数
    pub send_failures: AtomicU64,
    /// 读取失败次数（含对端关闭）
    pub receive_failures: AtomicU64,
    /// 遥测线程收到的入站行数
    pub inbound_lines: AtomicU64,
    /// 解析成功的遥测帧数
    pub telemetry_frames: AtomicU64,
    /// 成功转发的遥测命令数
    pub telemetry_forwarded: AtomicU64,
}

impl LinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// 获取指标快照
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
            commands_sent: self.commands_sent.load(Ordering::Relaxed),
            replies: self.replies.load(Ordering::Relaxed),
            reply_timeouts: self.reply_timeouts.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            receive_failures: self.receive_failures.load(Ordering::Relaxed),
            inbound_lines: self.inbound_lines.load(Ordering::Relaxed),
            telemetry_frames: self.telemetry_frames.load(Ordering::Relaxed),
            telemetry_forwarded: self.telemetry_forwarded.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        for counter in [
            &self.connect_attempts,
            &self.connect_failures,
            &self.commands_sent,
            &self.replies,
            &self.reply_timeouts,
            &self.send_failures,
            &self.receive_failures,
            &self.inbound_lines,
            &self.telemetry_frames,
            &self.telemetry_forwarded,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub connect_attempts: u64,
    pub connect_failures: u64,
    pub commands_sent: u64,
    pub replies: u64,
    pub reply_timeouts: u64,
    pub send_failures: u64,
    pub receive_failures: u64,
    pub inbound_lines: u64,
    pub telemetry_frames: u64,
    pub telemetry_forwarded: u64,
}

impl MetricsSnapshot {
    /// 回复率（百分比）
    ///
    /// 如果 `commands_sent` 为 0，返回 0.0。
    pub fn reply_rate(&self) -> f64 {
        if self.commands_sent == 0 {
            return 0.0;
        }
        (self.replies as f64 / self.commands_sent as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_and_reset() {
        let metrics = LinkMetrics::new();
        LinkMetrics::incr(&metrics.commands_sent);
        LinkMetrics::incr(&metrics.commands_sent);
        LinkMetrics::incr(&metrics.replies);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.commands_sent, 2);
        assert_eq!(snapshot.replies, 1);
        assert!((snapshot.reply_rate() - 50.0).abs() < f64::EPSILON);

        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_reply_rate_empty() {
        assert_eq!(MetricsSnapshot::default().reply_rate(), 0.0);
    }
}
