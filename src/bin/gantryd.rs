//! Controller daemon: serves one JSON configuration document over
//! HTTP/1. `GET /path` prints the addressed subtree, `PUT /path`
//! applies an overlay patch from the request body, `DELETE /path`
//! removes the addressed member. Unresolvable paths answer 404,
//! malformed JSON answers 400.
//!
//! One thread per connection; the blocking socket plays the event
//! engine's role, with per-state read timeouts standing in for the
//! connection's timer table.

use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};

use bumpalo::Bump;
use eyre::{eyre, Result, WrapErr};
use tracing::{debug, error, info};

use gantry::http::status;
use gantry::{
    clone_value, compile, get_value, parse, print, Compiled, H1Conn, Handler, Interest, Request,
    Response, SocketConf, Transport, Value,
};

const DEFAULT_LISTEN: &str = "127.0.0.1:8660";
const INITIAL_CONF: &[u8] = b"{\"listeners\":{},\"applications\":{}}";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_LISTEN.into());

    let listener = TcpListener::bind(&addr).wrap_err_with(|| format!("cannot bind {addr}"))?;
    info!(%addr, "gantryd listening");

    let store = Arc::new(Mutex::new(INITIAL_CONF.to_vec()));

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "accept failed");
                continue;
            }
        };

        let store = Arc::clone(&store);
        std::thread::spawn(move || {
            if let Err(e) = serve(stream, store) {
                debug!(error = %e, "connection ended");
            }
        });
    }

    Ok(())
}

/// Blocking socket adapter. A read that trips the socket timeout is
/// reported to the state machine as `WouldBlock` and flagged here so
/// the driver can convert it into a timer event.
struct BlockingSocket {
    stream: TcpStream,
    timed_out: bool,
}

impl Transport for BlockingSocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf).map_err(|e| {
            if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) {
                self.timed_out = true;
                io::Error::from(io::ErrorKind::WouldBlock)
            } else {
                e
            }
        })
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn set_nodelay(&mut self) -> io::Result<()> {
        self.stream.set_nodelay(true)
    }
}

fn serve(stream: TcpStream, store: Arc<Mutex<Vec<u8>>>) -> Result<()> {
    let mut conn = H1Conn::new(SocketConf::default());
    let mut handler = Controller { store };
    let mut io = BlockingSocket {
        stream,
        timed_out: false,
    };

    loop {
        match conn.interest() {
            Interest::Read => {
                let timeout = conn.timeout().map(|t| t.value);
                io.stream.set_read_timeout(timeout)?;

                io.timed_out = false;
                conn.on_readable(&mut io, &mut handler);

                if io.timed_out {
                    conn.on_timeout(&mut handler);
                }
            }
            Interest::Write => {
                conn.on_writable(&mut io, &mut handler);
            }
            Interest::Closed => {
                return Ok(());
            }
        }
    }
}

/// The upper layer: configuration storage addressed by request paths.
struct Controller {
    store: Arc<Mutex<Vec<u8>>>,
}

impl Handler for Controller {
    fn ready(&mut self, req: &Request) -> Response {
        let path = req.target.split('?').next().unwrap_or("/").to_string();

        match self.dispatch(req, &path) {
            Ok(resp) => resp,
            Err(e) => {
                debug!(error = %e, "request failed");
                json_response(status::INTERNAL_SERVER_ERROR, b"{\"error\":\"Internal error.\"}\r\n")
            }
        }
    }
}

impl Controller {
    fn dispatch(&mut self, req: &Request, path: &str) -> Result<Response> {
        match req.method.as_str() {
            "GET" => self.get(path),
            "PUT" => self.put(req, path),
            "DELETE" => self.delete(path),
            _ => Ok(json_response(
                status::METHOD_NOT_ALLOWED,
                b"{\"error\":\"Invalid method.\"}\r\n",
            )),
        }
    }

    fn get(&self, path: &str) -> Result<Response> {
        let stored = self.stored();
        let arena = Bump::new();
        let root = parse(&stored, &arena).map_err(|_| eyre!("stored configuration corrupt"))?;

        match get_value(root, path) {
            Some(value) => {
                let mut body = print(value, true);
                body.extend_from_slice(b"\r\n");
                Ok(json_response(status::OK, body))
            }
            None => Ok(not_found()),
        }
    }

    fn put(&mut self, req: &Request, path: &str) -> Result<Response> {
        let body = req.body.as_deref().unwrap_or_default();

        let arena = Bump::new();
        let value = match parse(body, &arena) {
            Ok(v) => v,
            Err(_) => {
                return Ok(json_response(
                    status::BAD_REQUEST,
                    b"{\"error\":\"Invalid JSON.\"}\r\n",
                ))
            }
        };

        if path == "/" || path.is_empty() {
            self.store_value(value);
            return Ok(success());
        }

        let stored = self.stored();
        let root = parse(&stored, &arena).map_err(|_| eyre!("stored configuration corrupt"))?;

        match compile(root, Some(value), path, &arena) {
            Compiled::Ops(ops) => {
                let patched = clone_value(root, Some(ops), &arena)?;
                self.store_value(patched);
                Ok(success())
            }
            Compiled::Declined => Ok(not_found()),
        }
    }

    fn delete(&mut self, path: &str) -> Result<Response> {
        let stored = self.stored();
        let arena = Bump::new();
        let root = parse(&stored, &arena).map_err(|_| eyre!("stored configuration corrupt"))?;

        match compile(root, None, path, &arena) {
            Compiled::Ops(ops) => {
                let patched = clone_value(root, Some(ops), &arena)?;
                self.store_value(patched);
                Ok(success())
            }
            Compiled::Declined => Ok(not_found()),
        }
    }

    fn stored(&self) -> Vec<u8> {
        self.store.lock().expect("store poisoned").clone()
    }

    fn store_value(&self, value: Value<'_>) {
        *self.store.lock().expect("store poisoned") = print(value, false);
    }
}

fn success() -> Response {
    json_response(status::OK, b"{\"success\":\"Reconfiguration done.\"}\r\n")
}

fn not_found() -> Response {
    json_response(status::NOT_FOUND, b"{\"error\":\"Value doesn't exist.\"}\r\n")
}

fn json_response(code: u16, body: impl Into<Vec<u8>>) -> Response {
    Response::with_body(code, body.into()).field("Content-Type", &b"application/json"[..])
}
