//! Web front end: `GET /eval/<list-expression>`.
//!
//! Every request is evaluated against the one shared session environment,
//! so definitions made by one client (or at the console) are visible to
//! all others.  The response is a small HTML page with a `mailto:` link for
//! the evaluated recipient set plus a readable comma-joined list.
//!
//! The HTTP handling is deliberately minimal: one task per connection,
//! request line only, `Connection: close`.  Expressions arrive
//! percent-encoded in the path.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::console::format_recipients;
use crate::environment::Environment;
use crate::eval;
use crate::parser;

/// Default server port.
pub const DEFAULT_PORT: u16 = 5021;

/// Longest request head we are willing to buffer.
const MAX_REQUEST_BYTES: usize = 8 * 1024;

/// Accept connections forever, evaluating each request against `env`.
pub async fn serve(listener: TcpListener, env: Arc<Environment>) -> io::Result<()> {
    loop {
        let (stream, _addr) = listener.accept().await?;
        let env = Arc::clone(&env);
        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, env).await {
                eprintln!("norn: web: {e}");
            }
        });
    }
}

async fn handle_client(mut stream: TcpStream, env: Arc<Environment>) -> io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    // Read until the end of the request head.
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        if buf.len() > MAX_REQUEST_BYTES {
            break;
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf);
    let request_line = head.lines().next().unwrap_or("");
    let response = respond(request_line, &env);
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

/// Build the full HTTP response for one request line.  Pure with respect
/// to I/O, so it is testable without sockets.
fn respond(request_line: &str, env: &Environment) -> String {
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return plain_response(400, "Bad Request", "malformed request line\n");
    };
    if method != "GET" {
        return plain_response(405, "Method Not Allowed", "only GET is supported\n");
    }
    let Some(encoded) = target.strip_prefix("/eval/") else {
        return plain_response(404, "Not Found", "try /eval/<list-expression>\n");
    };

    let input = percent_decode(encoded);
    let expr = match parser::parse(&input) {
        Ok(expr) => expr,
        Err(e) => return plain_response(400, "Bad Request", &format!("{e}\n")),
    };
    match eval::recipients(&expr, env) {
        Ok(recipients) => {
            let mailto: Vec<&str> = recipients.iter().map(|r| r.as_str()).collect();
            let body = format!(
                "<a href=\"mailto:{}\">email these recipients</a><br>{}\n",
                mailto.join(","),
                format_recipients(&recipients)
            );
            html_response(&body)
        }
        Err(e) => plain_response(400, "Bad Request", &format!("{e}\n")),
    }
}

fn html_response(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

fn plain_response(status: u16, reason: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: text/plain; charset=utf-8\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

/// Decode `%XX` escapes and `+` as space.  Invalid escapes pass through
/// literally; the parser will reject them with a proper message.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => match (hex_val(bytes.get(i + 1)), hex_val(bytes.get(i + 2))) {
                (Some(hi), Some(lo)) => {
                    out.push(hi * 16 + lo);
                    i += 3;
                }
                _ => {
                    out.push(b'%');
                    i += 1;
                }
            },
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(b: Option<&u8>) -> Option<u8> {
    match *b? {
        b @ b'0'..=b'9' => Some(b - b'0'),
        b @ b'a'..=b'f' => Some(b - b'a' + 10),
        b @ b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
