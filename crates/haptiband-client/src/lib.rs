//! # HaptiBand Client
//!
//! 高层接口：
//! - 图案（`Pattern`）与序列生成（`generate`）
//! - 序列调度（`SequenceScheduler`，同一链路上的序列互斥执行）
//! - 快捷提示（`Cue`，按键 → 预设序列）
//! - 图案库导出
//!
//! # 示例
//!
//! ```rust,no_run
//! use haptiband_client::{Pattern, SequenceScheduler, generate};
//! use haptiband_driver::{ConnectionManager, LinkConfig};
//! use haptiband_protocol::MotorChannel;
//! use std::time::Duration;
//!
//! let manager = ConnectionManager::new(LinkConfig::default());
//! let scheduler = SequenceScheduler::new(manager.connect()?);
//!
//! let pattern = Pattern::new(
//!     "turn left",
//!     &[MotorChannel::Left, MotorChannel::Front],
//!     Duration::from_millis(200),
//!     true,
//! );
//! let report = scheduler.run(&generate(&pattern)?)?;
//! println!("sent {} steps", report.steps_sent);
//! # Ok::<(), haptiband_client::ClientError>(())
//! ```

pub mod cues;
mod error;
pub mod export;
pub mod pattern;
pub mod scheduler;
pub mod sequence;

pub use cues::{Cue, all_off};
pub use error::ClientError;
pub use export::export_library;
pub use pattern::Pattern;
pub use scheduler::{RunReport, SequenceScheduler};
pub use sequence::{GeneratorConfig, Sequence, SequenceStep, TWO_BUZZ_GAP, generate, generate_with};
