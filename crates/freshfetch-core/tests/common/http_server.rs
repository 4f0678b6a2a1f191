//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a single static body for every path. HEAD and GET are counted so
//! tests can assert how much network traffic an update caused.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// Sent as `Last-Modified` on HEAD and GET when set.
    pub last_modified: Option<String>,
    /// Answer everything with 404.
    pub not_found: bool,
    /// Promise the full length but close after half the body.
    pub truncate_get: bool,
}

#[derive(Debug, Default)]
pub struct Hits {
    pub head: AtomicUsize,
    pub get: AtomicUsize,
}

impl Hits {
    pub fn head(&self) -> usize {
        self.head.load(Ordering::SeqCst)
    }

    pub fn get(&self) -> usize {
        self.get.load(Ordering::SeqCst)
    }
}

pub struct TestServer {
    pub url: String,
    pub hits: Arc<Hits>,
}

/// Starts a server in a background thread. Runs until the process exits.
pub fn start(body: Vec<u8>, opts: ServerOptions) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let opts = Arc::new(opts);
    let hits = Arc::new(Hits::default());
    let hits_srv = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let opts = Arc::clone(&opts);
            let hits = Arc::clone(&hits_srv);
            thread::spawn(move || handle(stream, &body, &opts, &hits));
        }
    });
    TestServer {
        url: format!("http://127.0.0.1:{}/data/file.bin", port),
        hits,
    }
}

fn handle(mut stream: TcpStream, body: &[u8], opts: &ServerOptions, hits: &Hits) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let method = request.split_whitespace().next().unwrap_or("");
    let is_head = method.eq_ignore_ascii_case("HEAD");
    if is_head {
        hits.head.fetch_add(1, Ordering::SeqCst);
    } else if method.eq_ignore_ascii_case("GET") {
        hits.get.fetch_add(1, Ordering::SeqCst);
    } else {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        return;
    }

    if opts.not_found {
        let _ = stream.write_all(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot found",
        );
        return;
    }

    let last_modified = opts
        .last_modified
        .as_deref()
        .map(|v| format!("Last-Modified: {}\r\n", v))
        .unwrap_or_default();
    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
        body.len(),
        last_modified
    );
    let _ = stream.write_all(head.as_bytes());
    if is_head {
        return;
    }
    let sent = if opts.truncate_get { body.len() / 2 } else { body.len() };
    let _ = stream.write_all(&body[..sent]);
    let _ = stream.flush();
}
