//! # HaptiBand Tools - 共享数据结构
//!
//! **依赖原则**: 只依赖 `haptiband-protocol`，不依赖 driver / client
//!
//! ## 包含模块
//!
//! - `record` - 图案记录（持久化格式）
//! - `library` - 图案库（名称 → 图案）
//! - `store` - 图案库存储（JSON 文件 / 内存）

mod error;
pub mod library;
pub mod record;
pub mod store;

pub use error::LibraryError;
pub use library::PatternLibrary;
pub use record::PatternRecord;
pub use store::{JsonFileStore, MemoryStore, PATTERNS_FILE, PatternStore};
