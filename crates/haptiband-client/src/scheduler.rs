//! 序列调度器
//!
//! 在一条链路上依次执行序列的每一步：发送命令（回复超时不中断），
//! 然后在调度线程上等待该步的 `settle_delay`。
//!
//! 同一链路上的两个序列不会交错：执行期间持有链路的序列闸门，
//! 后来的 `run` 会等待前一个完成（或中止）。

use crate::error::ClientError;
use crate::sequence::Sequence;
use haptiband_driver::{DriverError, HubLink, SEQUENCE_REPLY_TIMEOUT};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 一次执行的统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunReport {
    /// 已发送的步骤数
    pub steps_sent: usize,
    /// 收到的回复数（含空回复）
    pub replies: usize,
    /// 回复超时次数
    pub timeouts: usize,
    /// 执行耗时（含等待闸门之后的全部时间）
    pub elapsed: Duration,
}

/// 序列调度器
#[derive(Debug, Clone)]
pub struct SequenceScheduler {
    link: HubLink,
    reply_timeout: Duration,
}

impl SequenceScheduler {
    /// 使用序列默认回复超时（500ms）
    pub fn new(link: HubLink) -> Self {
        Self {
            link,
            reply_timeout: SEQUENCE_REPLY_TIMEOUT,
        }
    }

    pub fn with_reply_timeout(mut self, reply_timeout: Duration) -> Self {
        self.reply_timeout = reply_timeout;
        self
    }

    pub fn link(&self) -> &HubLink {
        &self.link
    }

    /// 执行序列（阻塞当前线程）
    ///
    /// # 错误
    /// - `DriverError::NotConnected` / `Send` / `Receive`: 中止剩余步骤
    pub fn run(&self, sequence: &Sequence) -> Result<RunReport, ClientError> {
        let _gate = self.link.sequence_guard();
        let started = Instant::now();
        let mut report = RunReport::default();
        let total = sequence.len();

        for (index, step) in sequence.iter().enumerate() {
            match self.link.send(&step.command, self.reply_timeout) {
                Ok(reply) => {
                    report.replies += 1;
                    if !reply.is_empty() {
                        debug!("Step {}/{} reply: {}", index + 1, total, reply);
                    }
                },
                Err(DriverError::Timeout) => report.timeouts += 1,
                Err(e) => {
                    warn!(
                        "Sequence aborted at step {}/{} ({}): {}",
                        index + 1,
                        total,
                        step.command,
                        e
                    );
                    return Err(e.into());
                },
            }
            report.steps_sent += 1;

            if !step.settle_delay.is_zero() {
                spin_sleep::sleep(step.settle_delay);
            }
        }

        report.elapsed = started.elapsed();
        info!(
            "Sequence of {} step(s) finished in {:?} ({} timeout(s))",
            report.steps_sent, report.elapsed, report.timeouts
        );
        Ok(report)
    }

    /// 在后台线程执行序列
    pub fn spawn(
        &self,
        sequence: Sequence,
    ) -> Result<JoinHandle<Result<RunReport, ClientError>>, ClientError> {
        let scheduler = self.clone();
        thread::Builder::new()
            .name("haptiband-sequence".into())
            .spawn(move || scheduler.run(&sequence))
            .map_err(|source| {
                ClientError::Driver(DriverError::Spawn {
                    name: "sequence",
                    source,
                })
            })
    }
}
