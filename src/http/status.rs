//! # Status-Line Tables
//!
//! Preallocated `HTTP/1.1 NNN Reason\r\n` lines for the four status
//! groups, indexed by `status - group_base`. Codes outside every group
//! render as a numeric-only line. The tables are immutable process-wide
//! data, shared freely across threads.

use std::borrow::Cow;

pub const OK: u16 = 200;
pub const NO_CONTENT: u16 = 204;
pub const BAD_REQUEST: u16 = 400;
pub const NOT_FOUND: u16 = 404;
pub const METHOD_NOT_ALLOWED: u16 = 405;
pub const LENGTH_REQUIRED: u16 = 411;
pub const PAYLOAD_TOO_LARGE: u16 = 413;
pub const REQUEST_HEADER_FIELDS_TOO_LARGE: u16 = 431;
pub const INTERNAL_SERVER_ERROR: u16 = 500;
pub const NOT_IMPLEMENTED: u16 = 501;
pub const VERSION_NOT_SUPPORTED: u16 = 505;

static SUCCESS: [&str; 7] = [
    "HTTP/1.1 200 OK\r\n",
    "HTTP/1.1 201 Created\r\n",
    "HTTP/1.1 202 Accepted\r\n",
    "HTTP/1.1 203 Non-Authoritative Information\r\n",
    "HTTP/1.1 204 No Content\r\n",
    "HTTP/1.1 205 Reset Content\r\n",
    "HTTP/1.1 206 Partial Content\r\n",
];

static REDIRECTION: [&str; 5] = [
    "HTTP/1.1 300 Multiple Choices\r\n",
    "HTTP/1.1 301 Moved Permanently\r\n",
    "HTTP/1.1 302 Found\r\n",
    "HTTP/1.1 303 See Other\r\n",
    "HTTP/1.1 304 Not Modified\r\n",
];

static CLIENT_ERROR: [&str; 32] = [
    "HTTP/1.1 400 Bad Request\r\n",
    "HTTP/1.1 401 Unauthorized\r\n",
    "HTTP/1.1 402 Payment Required\r\n",
    "HTTP/1.1 403 Forbidden\r\n",
    "HTTP/1.1 404 Not Found\r\n",
    "HTTP/1.1 405 Method Not Allowed\r\n",
    "HTTP/1.1 406 Not Acceptable\r\n",
    "HTTP/1.1 407 Proxy Authentication Required\r\n",
    "HTTP/1.1 408 Request Timeout\r\n",
    "HTTP/1.1 409 Conflict\r\n",
    "HTTP/1.1 410 Gone\r\n",
    "HTTP/1.1 411 Length Required\r\n",
    "HTTP/1.1 412 Precondition Failed\r\n",
    "HTTP/1.1 413 Payload Too Large\r\n",
    "HTTP/1.1 414 URI Too Long\r\n",
    "HTTP/1.1 415 Unsupported Media Type\r\n",
    "HTTP/1.1 416 Range Not Satisfiable\r\n",
    "HTTP/1.1 417 Expectation Failed\r\n",
    "HTTP/1.1 418\r\n",
    "HTTP/1.1 419\r\n",
    "HTTP/1.1 420\r\n",
    "HTTP/1.1 421\r\n",
    "HTTP/1.1 422\r\n",
    "HTTP/1.1 423\r\n",
    "HTTP/1.1 424\r\n",
    "HTTP/1.1 425\r\n",
    "HTTP/1.1 426\r\n",
    "HTTP/1.1 427\r\n",
    "HTTP/1.1 428\r\n",
    "HTTP/1.1 429\r\n",
    "HTTP/1.1 430\r\n",
    "HTTP/1.1 431 Request Header Fields Too Large\r\n",
];

static SERVER_ERROR: [&str; 6] = [
    "HTTP/1.1 500 Internal Server Error\r\n",
    "HTTP/1.1 501 Not Implemented\r\n",
    "HTTP/1.1 502 Bad Gateway\r\n",
    "HTTP/1.1 503 Service Unavailable\r\n",
    "HTTP/1.1 504 Gateway Timeout\r\n",
    "HTTP/1.1 505 HTTP Version Not Supported\r\n",
];

/// Returns the full status line for `status`, borrowing from the
/// tables for known codes and formatting a numeric-only line for the
/// rest.
pub fn status_line(status: u16) -> Cow<'static, str> {
    let n = status as usize;

    let known = match n {
        200..=206 => Some(SUCCESS[n - 200]),
        300..=304 => Some(REDIRECTION[n - 300]),
        400..=431 => Some(CLIENT_ERROR[n - 400]),
        500..=505 => Some(SERVER_ERROR[n - 500]),
        _ => None,
    };

    match known {
        Some(line) => Cow::Borrowed(line),
        None => Cow::Owned(format!("HTTP/1.1 {:03}\r\n", status)),
    }
}
