//! 协议常量定义

/// 默认 Hub 地址（头带 Hub 的 SoftAP 地址）
pub const DEFAULT_HUB_ADDRESS: &str = "192.168.4.1";

/// 默认 Hub 端口
pub const DEFAULT_HUB_PORT: u16 = 80;

/// 默认板 ID（线格式第一个字段）
pub const DEFAULT_BOARD_ID: u32 = 1;

/// 单次回复读取的最大字节数
pub const REPLY_MAX_BYTES: usize = 256;

/// 行终止符
pub const LINE_TERMINATOR: char = '\n';
