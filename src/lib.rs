//! # Gantry - Application Server Core
//!
//! Gantry extracts the two load-bearing cores of a multi-process
//! application server into a standalone crate:
//!
//! - **Configuration engine**: an arena-backed JSON value tree with a
//!   strict parser, slash-path lookup, an overlay-patch compiler and
//!   executor producing structurally shared copies, and a two-pass
//!   printer with a pretty mode.
//! - **HTTP/1.x connection protocol**: a sans-IO state machine driving
//!   one client connection through idle, header read, body read,
//!   response send and keepalive, with incremental parsing into
//!   fixed-capacity buffers and chunked response framing.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │       Controller binary (gantryd)       │
//! ├────────────────────┬────────────────────┤
//! │  conf: value tree  │  http: connection  │
//! │  parse / path /    │  state machine /   │
//! │  ops / print       │  framing / fields  │
//! ├────────────────────┴────────────────────┤
//! │   bumpalo arena    │  event engine seam │
//! │   (value storage)  │  (Transport trait) │
//! └─────────────────────────────────────────┘
//! ```
//!
//! The two cores are independent at runtime but share one allocation
//! discipline: value trees live in a `bumpalo` arena and are released
//! as a unit; there is no per-value free. A patched tree references
//! every subtree of the original that the patch did not touch, which
//! is sound because both trees share the arena's lifetime.
//!
//! ## Design Goals
//!
//! 1. **Single-pass protocol handling**: bytes are parsed as they
//!    arrive; completed units are consumed, partial units survive
//!    buffer promotion.
//! 2. **Bounded memory per connection**: header buffers have fixed
//!    capacities and a hard promotion limit; bodies are capped by
//!    `max_body_size`.
//! 3. **No hidden I/O**: the connection core never touches a socket
//!    directly; the event engine owns readiness, timers and the file
//!    descriptor, and hands the core a `Transport` on each event.
//!
//! ## Module Overview
//!
//! - [`conf`]: JSON value tree, parser, path lookup, patches, printer
//! - [`config`]: centralized constants and per-listener socket tuning
//! - [`http`]: HTTP/1 connection state machine and response framing

pub mod conf;
pub mod config;
pub mod http;

pub use conf::{clone_value, compile, get_value, parse, print, Compiled, Member, Op, Value};
pub use config::SocketConf;
pub use http::{H1Conn, Handler, Interest, Request, Response, Transport};
