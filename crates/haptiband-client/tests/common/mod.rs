//! 测试用的进程内 Hub（逐行记录，按需回复）

#![allow(dead_code)]

use haptiband_driver::LinkConfig;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

pub struct FakeHub {
    port: u16,
    received: Arc<Mutex<Vec<String>>>,
}

impl FakeHub {
    /// `reply`: 每行的回复；`None` 表示从不回复
    pub fn start(reply: Option<&'static str>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let received = Arc::new(Mutex::new(Vec::new()));

        let shared = Arc::clone(&received);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let received = Arc::clone(&shared);
                thread::spawn(move || serve(stream, received, reply));
            }
        });

        Self { port, received }
    }

    pub fn config(&self) -> LinkConfig {
        LinkConfig::new("127.0.0.1", self.port)
            .retry_delay(Duration::from_millis(10))
            .connect_timeout(Duration::from_secs(1))
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

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
}

fn serve(stream: TcpStream, received: Arc<Mutex<Vec<String>>>, reply: Option<&'static str>) {
    let mut writer = stream.try_clone().unwrap();
    for line in BufReader::new(stream).lines() {
        let Ok(line) = line else { break };
        received.lock().unwrap().push(line);
        if let Some(reply) = reply {
            if writer.write_all(reply.as_bytes()).is_err() {
                break;
            }
        }
    }
}
