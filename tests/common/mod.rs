#![allow(dead_code)]
//! Shared helpers for integration tests.

pub mod temp_files {
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// A throwaway service root: `config.yml` plus a `resources/` tree.
    ///
    /// The directory is removed when the value is dropped.
    pub struct ServiceRoot {
        dir: TempDir,
    }

    impl ServiceRoot {
        pub fn new() -> Self {
            let dir = tempfile::tempdir().expect("create temp service root");
            fs::create_dir_all(dir.path().join("resources")).expect("create resources dir");
            Self { dir }
        }

        pub fn path(&self) -> &Path {
            self.dir.path()
        }

        pub fn with_config(self, yaml: &str) -> Self {
            fs::write(self.dir.path().join("config.yml"), yaml).expect("write config.yml");
            self
        }

        /// Write `yaml` to `resources/<relative>`, creating parent directories.
        pub fn with_resource(self, relative: &str, yaml: &str) -> Self {
            let path: PathBuf = self.dir.path().join("resources").join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create resource subdir");
            }
            fs::write(&path, yaml).expect("write resource schema");
            self
        }
    }

    pub const WIDGETS_YAML: &str = r#"
name: widgets
type: collection
uri: /widgets
resource:
  uri: /widgets/{id}
  properties:
    id: { type: id }
    name: { type: string, length: 64 }
    price: { type: float, default: 0 }
"#;

    pub const SHELVES_YAML: &str = r#"
name: shelves
uri: /stores/{store}/shelves
resource:
  uri: /stores/{store}/shelves/{code}
  properties:
    store: { type: number }
    code: { type: string }
    label: { type: text }
"#;
}

pub mod test_server {
    use crudhook::{AppService, HttpServer, ServerHandle};
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener, TcpStream};
    use std::sync::Once;
    use std::time::Duration;

    static INIT: Once = Once::new();

    /// Give test coroutines a roomier stack than the production default.
    pub fn setup_may_runtime() {
        INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }

    /// An address on a port that was free a moment ago.
    pub fn free_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);
        addr
    }

    pub fn start(service: AppService) -> ServerHandle {
        setup_may_runtime();
        let handle = HttpServer(service)
            .start(free_addr())
            .expect("start server");
        handle.wait_ready().expect("server ready");
        handle
    }

    /// A parsed HTTP response.
    pub struct TestResponse {
        pub status: u16,
        pub headers: Vec<(String, String)>,
        pub body: serde_json::Value,
    }

    impl TestResponse {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }
    }

    /// Send one request and read exactly one response off the connection.
    pub fn send(addr: SocketAddr, method: &str, path: &str, body: Option<&str>) -> TestResponse {
        let body = body.unwrap_or("");
        let request = format!(
            "{method} {path} HTTP/1.1\r\n\
             Host: localhost\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\r\n{body}",
            body.len()
        );
        let raw = send_raw(addr, &request);
        parse_response(&raw)
    }

    pub fn send_raw(addr: SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).expect("connect");
        stream.write_all(request.as_bytes()).expect("write request");
        stream
            .set_read_timeout(Some(Duration::from_millis(2000)))
            .expect("set timeout");
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => {
                    buf.extend_from_slice(&tmp[..n]);
                    if response_complete(&buf) {
                        break;
                    }
                }
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {e:?}"),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn response_complete(buf: &[u8]) -> bool {
        let text = String::from_utf8_lossy(buf);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = head
            .lines()
            .filter_map(|l| l.split_once(':'))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.trim().parse::<usize>().ok());
        match length {
            Some(length) => body.len() >= length,
            None => false,
        }
    }

    pub fn parse_response(raw: &str) -> TestResponse {
        let (head, body) = raw.split_once("\r\n\r\n").unwrap_or((raw, ""));
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let headers = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        let body = serde_json::from_str(body).unwrap_or(serde_json::Value::Null);
        TestResponse {
            status,
            headers,
            body,
        }
    }
}
