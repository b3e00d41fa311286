#![allow(dead_code)]

use std::collections::HashMap;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::timeout;

const READ_DEADLINE: Duration = Duration::from_secs(5);
const MAX_HEADER_BYTES: usize = 16 * 1024;

pub const RSA_PRIVATE: &str = include_str!("../fixtures/rsa_private.pem");
pub const RSA_PUBLIC: &str = include_str!("../fixtures/rsa_public.pem");

/// Request line and headers of a JWKS fetch.
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub query: HashMap<String, String>,
}

impl CapturedRequest {
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Answers a single connection with `response` and reports what was asked.
pub async fn serve_once(
    response: impl AsRef<[u8]>,
) -> (String, oneshot::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (tx, rx) = oneshot::channel();
    let response = response.as_ref().to_vec();

    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            let req = read_request(&mut stream).await;
            let _ = tx.send(req);
            let _ = stream.write_all(&response).await;
        }
    });

    (format!("http://{}", addr), rx)
}

pub fn json_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

pub fn jwks_response(keys: &[serde_json::Value]) -> String {
    json_response("200 OK", &serde_json::json!({ "keys": keys }).to_string())
}

async fn read_request(stream: &mut TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = timeout(READ_DEADLINE, async {
        loop {
            let read = stream.read(&mut chunk).await.expect("read request");
            if read == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..read]);
            assert!(buf.len() <= MAX_HEADER_BYTES, "request headers too large");
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                return Some(pos);
            }
        }
    })
    .await
    .expect("timed out reading request");

    let Some(header_end) = header_end else {
        return CapturedRequest {
            method: "<incomplete>".to_string(),
            path: "<eof>".to_string(),
            headers: Vec::new(),
            query: HashMap::new(),
        };
    };
    let head = String::from_utf8_lossy(&buf[..header_end]);
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or("").split_whitespace();
    let method = request_line.next().unwrap_or("").to_string();
    let target = request_line.next().unwrap_or("");
    let (path, query_str) = target.split_once('?').unwrap_or((target, ""));
    let query = url::form_urlencoded::parse(query_str.as_bytes())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect();

    CapturedRequest {
        method,
        path: path.to_string(),
        headers,
        query,
    }
}
