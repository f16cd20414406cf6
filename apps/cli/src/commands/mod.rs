//! 命令定义和实现

pub mod config;
pub mod connection;
pub mod hub;
pub mod pattern;

pub use config::{CliConfig, ConfigCommand};
pub use connection::ConnectArgs;
pub use hub::{CueCommand, ListenCommand, RawCommand, SendCommand};
pub use pattern::PatternCommand;
