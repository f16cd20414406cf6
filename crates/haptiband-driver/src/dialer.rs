//! 建立 TCP 连接
//!
//! `ConnectionManager` 通过 `Dialer` 发起单次连接尝试，重试逻辑由管理器负责。

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::trace;

/// 单次连接尝试
pub trait Dialer: Send + Sync {
    /// 尝试连接一次
    ///
    /// 成功时返回已连接（阻塞模式）的 `TcpStream`。
    fn dial(&self, address: &str, port: u16, timeout: Duration) -> io::Result<TcpStream>;
}

/// 生产环境使用的 TCP 拨号器
///
/// - 依次尝试解析出的每个地址，返回最后一个错误
/// - 关闭 Nagle 算法（TCP_NODELAY），每条命令立即发出
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

impl Dialer for TcpDialer {
    fn dial(&self, address: &str, port: u16, timeout: Duration) -> io::Result<TcpStream> {
        let mut last_err = None;

        for addr in (address, port).to_socket_addrs()? {
            trace!("Dialing {}", addr);
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                },
                Err(e) => last_err = Some(e),
            }
        }

        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("{}:{} did not resolve to any address", address, port),
            )
        }))
    }
}

impl<D: Dialer + ?Sized> Dialer for std::sync::Arc<D> {
    fn dial(&self, address: &str, port: u16, timeout: Duration) -> io::Result<TcpStream> {
        (**self).dial(address, port, timeout)
    }
}
