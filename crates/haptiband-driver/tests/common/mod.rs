//! 测试用的进程内 Hub
//!
//! 监听 127.0.0.1 上的随机端口，逐行记录收到的命令，并按响应函数回复。

#![allow(dead_code)]

use haptiband_driver::LinkConfig;
use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

type Responder = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

pub struct FakeHub {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<String>>>,
    peers: Arc<Mutex<Vec<TcpStream>>>,
    accepted: Arc<AtomicUsize>,
}

impl FakeHub {
    /// 启动 Hub，`respond` 对每一行返回可选的回复
    pub fn start(respond: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        let peers = Arc::new(Mutex::new(Vec::new()));
        let accepted = Arc::new(AtomicUsize::new(0));
        let respond: Responder = Arc::new(respond);

        {
            let received = Arc::clone(&received);
            let peers = Arc::clone(&peers);
            let accepted = Arc::clone(&accepted);
            thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(stream) = stream else { break };
                    accepted.fetch_add(1, Ordering::SeqCst);
                    peers.lock().unwrap().push(stream.try_clone().unwrap());

                    let received = Arc::clone(&received);
                    let respond = Arc::clone(&respond);
                    thread::spawn(move || serve(stream, received, respond));
                }
            });
        }

        Self {
            addr,
            received,
            peers,
            accepted,
        }
    }

    /// 每行回复 `ok`
    pub fn replying_ok() -> Self {
        Self::start(|_| Some("ok\n".to_string()))
    }

    /// 从不回复
    pub fn silent() -> Self {
        Self::start(|_| None)
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// 指向此 Hub 的配置（短重试间隔、短超时）
    pub fn config(&self) -> LinkConfig {
        LinkConfig::new("127.0.0.1", self.port())
            .retry_delay(Duration::from_millis(10))
            .connect_timeout(Duration::from_secs(1))
            .reply_timeout(Duration::from_millis(200))
            .poll_interval(Duration::from_millis(20))
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    /// 等待至少收到 `count` 行
    pub fn wait_for_lines(&self, count: usize, timeout: Duration) -> Vec<String> {
        let deadline = Instant::now() + timeout;
        loop {
            let lines = self.received();
            if lines.len() >= count || Instant::now() >= deadline {
                return lines;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    /// 等待至少一个客户端连接被登记
    pub fn wait_for_peer(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.peers.lock().unwrap().is_empty() {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(5));
        }
        true
    }

    /// 向所有已连接的客户端推送数据
    pub fn push(&self, text: &str) {
        self.wait_for_peer(Duration::from_secs(1));
        for peer in self.peers.lock().unwrap().iter_mut() {
            let _ = peer.write_all(text.as_bytes());
            let _ = peer.flush();
        }
    }

    /// 关闭所有已接受的连接
    pub fn close_all(&self) {
        self.wait_for_peer(Duration::from_secs(1));
        for peer in self.peers.lock().unwrap().drain(..) {
            let _ = peer.shutdown(Shutdown::Both);
        }
    }
}

fn serve(stream: TcpStream, received: Arc<Mutex<Vec<String>>>, respond: Responder) {
    let mut writer = stream.try_clone().unwrap();
    let reader = BufReader::new(stream);

    for line in reader.lines() {
        let Ok(line) = line else { break };
        received.lock().unwrap().push(line.clone());
        if let Some(reply) = respond(&line) {
            if writer.write_all(reply.as_bytes()).is_err() {
                break;
            }
        }
    }
}
