//! # HTTP/1 Connection State Machine
//!
//! [`H1Conn`] drives one client connection. The event engine owns the
//! socket and the timers; it delivers readiness through
//! [`H1Conn::on_readable`] / [`H1Conn::on_writable`], timer expiry
//! through [`H1Conn::on_timeout`], and after every call re-arms itself
//! from [`H1Conn::interest`] and [`H1Conn::timeout`]. The [`Transport`]
//! passed into each event is the only way the core touches bytes.
//!
//! ## Request Lifecycle
//!
//! Reads land in a fixed-capacity header buffer and are parsed
//! incrementally. When the buffer fills mid-request, the residual is
//! promoted into a large buffer, up to a hard cap (431 beyond it).
//! After the head completes, recognized fields run through the
//! dispatch table, the body (if any) is read to its exact
//! Content-Length, and the request goes up through [`Handler::ready`].
//! The returned response is framed and queued; when the queue drains,
//! the connection either closes or resets for the next request -
//! including the pipelined case where that request's bytes are already
//! in the buffer.
//!
//! ## Error Funnel
//!
//! Every failure converges on [`H1Conn::request_error`]: before the
//! response header has been sent it answers with a minimal
//! close-delimited error response; after it, or when no response is
//! possible, the connection just closes. Timeouts close without a
//! response.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use bytes::{Buf, Bytes};
use tracing::debug;

use super::buf::IoBuf;
use super::fields::{self, TransferEncoding};
use super::parse::{ParseResult, RequestParser};
use super::request::{Chain, Handler, Request, Response};
use super::status;
use crate::config::SocketConf;

/// The byte-level seam to the event engine's socket.
///
/// Nonblocking semantics: `WouldBlock` means "wait for the next
/// readiness event"; `Ok(0)` from a read means the peer closed.
pub trait Transport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
    fn set_nodelay(&mut self) -> io::Result<()>;
}

/// What the connection is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    Read,
    Write,
    Closed,
}

/// Which configured timeout covers the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
    Idle,
    HeaderRead,
    BodyRead,
    Send,
}

/// Timer instruction for the engine. `autoreset` timers restart on
/// every successful read or write.
#[derive(Debug, Clone, Copy)]
pub struct Timeout {
    pub kind: TimeoutKind,
    pub value: Duration,
    pub autoreset: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnState {
    Idle,
    ReadHeader,
    ReadBody,
    Send,
    Closed,
}

/// Per-connection HTTP/1 protocol state.
pub struct H1Conn {
    conf: SocketConf,
    state: ConnState,

    parser: RequestParser,
    read_buf: Option<IoBuf>,
    /// Large header buffers consumed by the current request.
    nbuffers: u32,

    request: Option<Request>,
    body: Option<IoBuf>,

    http11: bool,
    keepalive: bool,
    chunked: bool,
    te: TransferEncoding,
    header_sent: bool,

    write_queue: VecDeque<Bytes>,
    response_complete: bool,
    nodelay: bool,
}

impl H1Conn {
    pub fn new(conf: SocketConf) -> Self {
        Self {
            conf,
            state: ConnState::Idle,
            parser: RequestParser::default(),
            read_buf: None,
            nbuffers: 0,
            request: None,
            body: None,
            http11: false,
            keepalive: false,
            chunked: false,
            te: TransferEncoding::None,
            header_sent: false,
            write_queue: VecDeque::new(),
            response_complete: false,
            nodelay: false,
        }
    }

    pub fn interest(&self) -> Interest {
        match self.state {
            ConnState::Idle | ConnState::ReadHeader | ConnState::ReadBody => Interest::Read,
            ConnState::Send => Interest::Write,
            ConnState::Closed => Interest::Closed,
        }
    }

    pub fn timeout(&self) -> Option<Timeout> {
        let (kind, value, autoreset) = match self.state {
            ConnState::Idle => (TimeoutKind::Idle, self.conf.idle_timeout, false),
            ConnState::ReadHeader => (TimeoutKind::HeaderRead, self.conf.header_read_timeout, false),
            ConnState::ReadBody => (TimeoutKind::BodyRead, self.conf.body_read_timeout, true),
            ConnState::Send => (TimeoutKind::Send, self.conf.send_timeout, true),
            ConnState::Closed => return None,
        };

        Some(Timeout {
            kind,
            value,
            autoreset,
        })
    }

    /// Readiness event: the socket has bytes (or EOF) for us.
    pub fn on_readable<T: Transport, H: Handler>(&mut self, io: &mut T, handler: &mut H) {
        match self.state {
            ConnState::Idle => {
                debug!("h1 read header");
                self.state = ConnState::ReadHeader;
                self.read_header(io, handler);
            }
            ConnState::ReadHeader => self.read_header(io, handler),
            ConnState::ReadBody => self.read_body(io, handler),
            ConnState::Send | ConnState::Closed => {}
        }
    }

    /// Readiness event: the socket accepts writes again.
    pub fn on_writable<T: Transport, H: Handler>(&mut self, io: &mut T, handler: &mut H) {
        if self.state == ConnState::Send {
            self.write_ready(io, handler);
        }
    }

    /// The armed timer fired: close, surfacing the failure first.
    pub fn on_timeout<H: Handler>(&mut self, handler: &mut H) {
        debug!(state = ?self.state, "h1 conn timeout");
        self.conn_close(handler);
    }

    /// Streams additional body buffers for the in-flight response.
    pub fn send<T: Transport, H: Handler>(&mut self, io: &mut T, handler: &mut H, out: Chain) {
        if self.state != ConnState::Send {
            return;
        }
        self.send_chain(out);
        self.write_ready(io, handler);
    }

    fn read_header<T: Transport, H: Handler>(&mut self, io: &mut T, handler: &mut H) {
        let size = self.conf.header_buffer_size;
        let buf = self.read_buf.get_or_insert_with(|| IoBuf::new(size));

        match io.read(buf.spare_mut()) {
            Ok(0) => {
                debug!("h1 conn closed by peer");
                self.conn_close(handler);
            }
            Ok(n) => {
                buf.fill(n);
                self.header_parse(io, handler);
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => {
                debug!(error = %e, "h1 conn read error");
                self.conn_close(handler);
            }
        }
    }

    fn header_parse<T: Transport, H: Handler>(&mut self, io: &mut T, handler: &mut H) {
        debug!("h1 header parse");

        let Some(buf) = self.read_buf.as_mut() else {
            return;
        };
        let req = self.request.get_or_insert_with(Request::default);

        match self.parser.parse(buf, req) {
            ParseResult::Done => {
                // Keepalive is off in HTTP/1.0 and on in HTTP/1.1 by
                // default; the Connection field may override it below.
                self.http11 = req.version_minor != 0;
                self.keepalive = self.http11;

                match fields::process(req, &mut self.keepalive, &mut self.te) {
                    Ok(()) => self.body_read(io, handler),
                    Err(status) => self.request_error(io, handler, status),
                }
            }

            ParseResult::Again => {
                if buf.free() == 0 {
                    self.grow_header_buffer(io, handler);
                } else {
                    self.state = ConnState::ReadHeader;
                }
            }

            ParseResult::Invalid => self.request_error(io, handler, status::BAD_REQUEST),
            ParseResult::UnsupportedVersion => {
                self.request_error(io, handler, status::VERSION_NOT_SUPPORTED)
            }
        }
    }

    fn grow_header_buffer<T: Transport, H: Handler>(&mut self, io: &mut T, handler: &mut H) {
        let size = self.conf.large_header_buffer_size;

        let Some(buf) = self.read_buf.as_mut() else {
            return;
        };

        if size <= buf.used() || self.nbuffers >= self.conf.large_header_buffers {
            self.request_error(io, handler, status::REQUEST_HEADER_FIELDS_TOO_LARGE);
            return;
        }

        debug!(nbuffers = self.nbuffers + 1, "h1 large header buffer");

        self.nbuffers += 1;

        let mut large = IoBuf::new(size);
        large.take_residual(buf);
        *buf = large;

        self.state = ConnState::ReadHeader;
    }

    fn body_read<T: Transport, H: Handler>(&mut self, io: &mut T, handler: &mut H) {
        let Some(req) = self.request.as_ref() else {
            return;
        };

        debug!(cl = ?req.content_length, te = ?self.te, "h1 body read");

        match self.te {
            TransferEncoding::Chunked => {
                // Request-side chunked bodies are not supported.
                self.request_error(io, handler, status::LENGTH_REQUIRED);
                return;
            }
            TransferEncoding::Unsupported => {
                self.request_error(io, handler, status::NOT_IMPLEMENTED);
                return;
            }
            TransferEncoding::None => {}
        }

        let length = req.content_length.unwrap_or(0);

        if length == 0 {
            self.request_ready(io, handler);
            return;
        }

        if length > self.conf.max_body_size {
            self.request_error(io, handler, status::PAYLOAD_TOO_LARGE);
            return;
        }

        let mut body = IoBuf::new(length as usize);

        if let Some(buf) = self.read_buf.as_mut() {
            let n = buf.used().min(body.free());
            body.spare_mut()[..n].copy_from_slice(&buf.bytes()[..n]);
            body.fill(n);
            buf.advance(n);
        }

        let rest = body.free();
        self.body = Some(body);

        debug!(rest, "h1 body rest");

        if rest != 0 {
            self.state = ConnState::ReadBody;
            return;
        }

        self.request_ready(io, handler);
    }

    fn read_body<T: Transport, H: Handler>(&mut self, io: &mut T, handler: &mut H) {
        let Some(body) = self.body.as_mut() else {
            return;
        };

        match io.read(body.spare_mut()) {
            Ok(0) => {
                debug!("h1 conn closed by peer");
                self.conn_close(handler);
            }
            Ok(n) => {
                body.fill(n);
                debug!(rest = body.free(), "h1 body rest");

                if body.free() == 0 {
                    self.request_ready(io, handler);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => {
                debug!(error = %e, "h1 conn read error");
                self.conn_close(handler);
            }
        }
    }

    fn request_ready<T: Transport, H: Handler>(&mut self, io: &mut T, handler: &mut H) {
        debug!("h1 request ready");

        let Some(mut req) = self.request.take() else {
            return;
        };
        req.body = self.body.take().map(IoBuf::into_vec);

        let resp = handler.ready(&req);
        self.send_response(io, handler, resp);
    }

    fn send_response<T: Transport, H: Handler>(
        &mut self,
        io: &mut T,
        handler: &mut H,
        resp: Response,
    ) {
        debug!(status = resp.status, "h1 header send");

        self.header_sent = true;

        // A response without its own length is framed by the transfer
        // encoding: chunked for HTTP/1.1, connection close for 1.0.
        if resp.content_length.is_none() {
            if self.http11 {
                self.chunked = true;
            } else {
                self.keepalive = false;
            }
        }

        let line = status::status_line(resp.status);

        let mut size = line.len() + "\r\n".len();
        for field in resp.fields.iter().filter(|f| !f.skip) {
            size += field.name.len() + ": \r\n".len() + field.value.len();
        }
        if resp.content_length.is_some() {
            size += "Content-Length: \r\n".len() + 20;
        }
        if self.http11 != self.keepalive {
            size += "Connection: keep-alive\r\n".len();
        }
        if self.chunked {
            size += "Transfer-Encoding: chunked\r\n".len();
        }

        let mut header = Vec::with_capacity(size);

        header.extend_from_slice(line.as_bytes());

        for field in resp.fields.iter().filter(|f| !f.skip) {
            header.extend_from_slice(field.name.as_bytes());
            header.extend_from_slice(b": ");
            header.extend_from_slice(&field.value);
            header.extend_from_slice(b"\r\n");
        }

        if let Some(length) = resp.content_length {
            header.extend_from_slice(b"Content-Length: ");
            header.extend_from_slice(length.to_string().as_bytes());
            header.extend_from_slice(b"\r\n");
        }

        if self.http11 != self.keepalive {
            header.extend_from_slice(if self.keepalive {
                b"Connection: keep-alive\r\n".as_slice()
            } else {
                b"Connection: close\r\n".as_slice()
            });
        }

        if self.chunked {
            // The blank line ending the head is supplied by the first
            // chunk header.
            header.extend_from_slice(b"Transfer-Encoding: chunked\r\n");
        } else {
            header.extend_from_slice(b"\r\n");
        }

        debug_assert!(header.len() <= size);

        self.write_queue.push_back(Bytes::from(header));
        self.state = ConnState::Send;

        self.send_chain(resp.body);
        self.write_ready(io, handler);
    }

    fn send_chain(&mut self, out: Chain) {
        if self.chunked {
            let size = out.len();

            if size > 0 {
                let head = format!("\r\n{:x}\r\n", size);
                self.write_queue.push_back(Bytes::from(head));
                self.write_queue.extend(out.bufs);
            }

            if out.last {
                self.write_queue.push_back(Bytes::from_static(b"\r\n0\r\n\r\n"));
            }
        } else {
            self.write_queue.extend(out.bufs);
        }

        if out.last {
            self.response_complete = true;
        }
    }

    fn write_ready<T: Transport, H: Handler>(&mut self, io: &mut T, handler: &mut H) {
        loop {
            while let Some(front) = self.write_queue.front_mut() {
                if front.is_empty() {
                    self.write_queue.pop_front();
                    continue;
                }

                match io.write(front) {
                    Ok(0) => {
                        self.conn_close(handler);
                        return;
                    }
                    Ok(n) => front.advance(n),
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                        self.state = ConnState::Send;
                        return;
                    }
                    Err(e) => {
                        debug!(error = %e, "h1 conn write error");
                        self.conn_close(handler);
                        return;
                    }
                }
            }

            debug!("h1 sent");

            if !self.response_complete {
                // Streaming response: waiting for the next chain.
                self.state = ConnState::Send;
                return;
            }

            if !self.keepalive {
                debug!("h1 close");
                self.state = ConnState::Closed;
                return;
            }

            self.keepalive_reset(io);

            let Some(buf) = self.read_buf.as_mut() else {
                self.state = ConnState::Idle;
                return;
            };

            if buf.used() == 0 {
                debug!("h1 keepalive");
                buf.reset();
                self.state = ConnState::Idle;
                return;
            }

            // The next request is already buffered.
            debug!("h1 pipelining");
            buf.compact();
            self.state = ConnState::ReadHeader;
            self.header_parse(io, handler);

            if self.write_queue.is_empty() {
                return;
            }
        }
    }

    fn keepalive_reset<T: Transport>(&mut self, io: &mut T) {
        if !self.nodelay {
            if let Err(e) = io.set_nodelay() {
                debug!(error = %e, "h1 tcp_nodelay failed");
            }
            self.nodelay = true;
        }

        self.parser.reset();
        self.request = None;
        self.body = None;
        self.http11 = false;
        self.keepalive = false;
        self.chunked = false;
        self.te = TransferEncoding::None;
        self.header_sent = false;
        self.nbuffers = 0;
        self.response_complete = false;
    }

    /// The error funnel: answer with `status` when the response header
    /// has not been sent yet, close otherwise. Error responses never
    /// keep the connection alive.
    fn request_error<T: Transport, H: Handler>(&mut self, io: &mut T, handler: &mut H, status: u16) {
        debug!(status, "h1 request error");

        handler.error(status);

        self.request = None;
        self.body = None;

        if self.header_sent {
            self.state = ConnState::Closed;
            return;
        }

        self.keepalive = false;
        self.send_response(io, handler, Response::empty(status));
    }

    /// Raw close: no response is possible. Surfaces the failure to the
    /// upper layer when a request was in flight.
    fn conn_close<H: Handler>(&mut self, handler: &mut H) {
        debug!("h1 conn close");

        if self.request.is_some() || (self.header_sent && !self.response_complete) {
            handler.error(0);
        }

        self.state = ConnState::Closed;
    }
}
