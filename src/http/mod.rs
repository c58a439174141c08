//! # HTTP/1.x Connection Core
//!
//! A sans-IO state machine for one client connection. The event engine
//! owns the socket, readiness and timers; this module owns everything
//! between the bytes and the application: incremental request parsing
//! into fixed-capacity buffers, header field semantics, body handling,
//! response framing (including chunked transfer encoding), keepalive
//! and pipelining.
//!
//! ## State Machine
//!
//! ```text
//!          ready                DONE                 body complete
//!  idle ────────> read-header ───────> read-body ──────────┐
//!   ▲                 │   ▲ AGAIN          │                ▼
//!   │                 └───┘ (grow buffer)  │          request-ready
//!   │                                      │                │
//!   │ keepalive                            ▼                ▼
//!   └────────────────── sent <─────────── send <──── handler response
//!                         │ !keepalive
//!                         ▼
//!                       close
//! ```
//!
//! Any error or timeout in any state collapses into the close path,
//! which surfaces the failure to the request first and then gives the
//! connection back to the engine.
//!
//! ## Module Overview
//!
//! - [`buf`]: fixed-capacity read buffers with explicit used/free
//!   accounting
//! - [`parse`]: incremental request line and field parser
//! - [`fields`]: per-field semantic handlers (Connection,
//!   Transfer-Encoding, Content-Length, ...)
//! - [`status`]: preallocated status-line tables
//! - [`request`]: request/response records and the upper-layer seam
//! - [`proto`]: the connection state machine itself

pub mod buf;
pub mod fields;
pub mod parse;
pub mod proto;
pub mod request;
pub mod status;

pub use proto::{H1Conn, Interest, TimeoutKind, Transport};
pub use request::{Chain, Field, Handler, Request, Response};
