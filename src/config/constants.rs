//! # Configuration Constants
//!
//! Default tunables for the HTTP connection core, co-located with the
//! relationships between them.
//!
//! ## Dependency Graph
//!
//! ```text
//! HEADER_BUFFER_SIZE (2 KiB)
//!       │
//!       └─> LARGE_HEADER_BUFFER_SIZE (8 KiB, must be >=)
//!             A request head that does not fit the initial buffer is
//!             promoted into a large buffer; promotion is refused with
//!             431 when the residual already fills a large buffer.
//!
//! LARGE_HEADER_BUFFERS (4)
//!       │
//!       └─> Hard cap on promotions per request. Total header memory
//!           per connection is bounded by
//!           HEADER_BUFFER_SIZE + LARGE_HEADER_BUFFERS * LARGE_HEADER_BUFFER_SIZE.
//!
//! MAX_BODY_SIZE (8 MiB)
//!       │
//!       └─> Requests advertising a larger Content-Length are refused
//!           with 413 before any body buffer is allocated.
//! ```
//!
//! ## Timeouts
//!
//! Each connection state arms exactly one timer. The idle timer covers
//! a keepalive connection with no request in flight; the read and send
//! timers cover forward progress and auto-reset on each successful
//! read or write.

use std::time::Duration;

/// Initial header read buffer capacity.
pub const HEADER_BUFFER_SIZE: usize = 2048;

/// Capacity of each promoted header buffer.
pub const LARGE_HEADER_BUFFER_SIZE: usize = 8192;

/// Maximum number of large header buffers per request.
pub const LARGE_HEADER_BUFFERS: u32 = 4;

/// Maximum accepted request body size in bytes.
pub const MAX_BODY_SIZE: u64 = 8 * 1024 * 1024;

/// Seconds a keepalive connection may sit with no request in flight.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(180);

/// Seconds allowed to read a complete request head.
pub const HEADER_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Seconds allowed between body reads; auto-resets on progress.
pub const BODY_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Seconds allowed between response writes; auto-resets on progress.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(30);

const _: () = assert!(LARGE_HEADER_BUFFER_SIZE >= HEADER_BUFFER_SIZE);
const _: () = assert!(LARGE_HEADER_BUFFERS >= 1);

/// Per-listener socket tuning consumed by the HTTP connection core.
///
/// A listener hands a copy of this record to every connection it
/// accepts; the record never changes for the lifetime of a connection.
#[derive(Debug, Clone)]
pub struct SocketConf {
    pub header_buffer_size: usize,
    pub large_header_buffer_size: usize,
    pub large_header_buffers: u32,
    pub max_body_size: u64,
    pub idle_timeout: Duration,
    pub header_read_timeout: Duration,
    pub body_read_timeout: Duration,
    pub send_timeout: Duration,
}

impl Default for SocketConf {
    fn default() -> Self {
        Self {
            header_buffer_size: HEADER_BUFFER_SIZE,
            large_header_buffer_size: LARGE_HEADER_BUFFER_SIZE,
            large_header_buffers: LARGE_HEADER_BUFFERS,
            max_body_size: MAX_BODY_SIZE,
            idle_timeout: IDLE_TIMEOUT,
            header_read_timeout: HEADER_READ_TIMEOUT,
            body_read_timeout: BODY_READ_TIMEOUT,
            send_timeout: SEND_TIMEOUT,
        }
    }
}
