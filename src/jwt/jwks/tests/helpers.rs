use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use p256::ecdsa::{SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey};
use rand::thread_rng;
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub(super) struct JwsVector {
    pub(super) name: String,
    pub(super) jwks: Value,
    #[allow(dead_code)]
    pub(super) token: String,
}

pub(super) fn jws_vector(name: &str) -> JwsVector {
    let vectors: Vec<JwsVector> = serde_json::from_str(include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/jws_vectors.json"
    )))
    .expect("vectors");
    vectors
        .into_iter()
        .find(|vector| vector.name == name)
        .expect("vector")
}

/// A fresh P-256 key as a JWK object, with `kid` when given.
pub(super) fn p256_jwk(kid: Option<&str>) -> Value {
    let signing_key = P256SigningKey::random(&mut thread_rng());
    let verifying_key = P256VerifyingKey::from(&signing_key);
    let point = verifying_key.to_encoded_point(false);
    let mut jwk = json!({
        "kty": "EC",
        "crv": "P-256",
        "x": URL_SAFE_NO_PAD.encode(point.x().expect("x coord")),
        "y": URL_SAFE_NO_PAD.encode(point.y().expect("y coord")),
    });
    if let Some(kid) = kid {
        jwk["kid"] = json!(kid);
    }
    jwk
}

pub(super) fn oct_jwk(kid: &str, secret: &[u8]) -> Value {
    json!({
        "kty": "oct",
        "kid": kid,
        "k": URL_SAFE_NO_PAD.encode(secret),
    })
}

pub(super) fn jwks_body(keys: Vec<Value>) -> String {
    json!({ "keys": keys }).to_string()
}

pub(super) fn serve_jwks_sequence(
    bodies: Vec<String>,
) -> (String, Arc<AtomicUsize>, Sender<()>, thread::JoinHandle<()>) {
    serve_responses(bodies.into_iter().map(|body| (200, body)).collect())
}

/// Answers one request per entry, in order, then stops accepting.
pub(super) fn serve_responses(
    responses: Vec<(u16, String)>,
) -> (String, Arc<AtomicUsize>, Sender<()>, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.set_nonblocking(true).expect("nonblocking");
    let addr = listener.local_addr().expect("addr");
    let count = Arc::new(AtomicUsize::new(0));
    let count_thread = Arc::clone(&count);
    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        while count_thread.load(Ordering::SeqCst) < responses.len() {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }
            match listener.accept() {
                Ok((mut stream, _)) => {
                    let idx = count_thread.fetch_add(1, Ordering::SeqCst);
                    let (status, body) = &responses[idx];
                    stream.set_nonblocking(false).expect("blocking");
                    let mut buf = [0u8; 2048];
                    let _ = stream.read(&mut buf);
                    let response = format!(
                        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        reason(*status),
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes());
                    let _ = stream.flush();
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(5));
                }
                Err(_) => break,
            }
        }
    });
    (format!("http://{}", addr), count, shutdown_tx, handle)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
