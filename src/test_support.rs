//! One-shot HTTP server for tests of the blocking HTTP clients.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

/// Answers exactly one request with a fixed status line and JSON body.
pub struct CannedServer {
    address: String,
    handle: JoinHandle<String>,
}

impl CannedServer {
    /// `status` is the status line after the version, e.g. `"201 Created"`.
    pub fn start(status: &str, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
        let address = listener
            .local_addr()
            .expect("test listener address")
            .to_string();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept test connection");
            let request = read_request(&mut stream);
            stream
                .write_all(response.as_bytes())
                .expect("write canned response");
            stream.flush().expect("flush canned response");
            request
        });

        Self { address, handle }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.address)
    }

    /// Raw request text (request line, headers and body) the server received.
    pub fn request(self) -> String {
        self.handle.join().expect("test server thread")
    }
}

/// A loopback URL with nothing listening on it.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let address = listener.local_addr().expect("test listener address");
    drop(listener);
    format!("http://{address}")
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        if let Some(header_end) = data.windows(4).position(|window| window == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&data[..header_end]).to_ascii_lowercase();
            let body_len = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= header_end + 4 + body_len {
                break;
            }
        }

        let read = stream.read(&mut chunk).expect("read test request");
        if read == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..read]);
    }

    String::from_utf8_lossy(&data).into_owned()
}
