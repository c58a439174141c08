//! # Header Field Dispatch
//!
//! After a request head parses, every field runs through a static
//! name-to-handler map. Names match case-insensitively (the map is
//! keyed by the lowercased name); value matching follows the wire
//! behavior of the original server, which compares `Connection: close`
//! and `Transfer-Encoding: chunked` byte-exactly.
//!
//! The map is immutable process-wide data, shared freely across
//! threads.

use phf::phf_map;
use smallvec::SmallVec;
use tracing::trace;

use super::request::Request;
use super::status;

/// Request-side transfer encoding, as declared by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferEncoding {
    #[default]
    None,
    Chunked,
    Unsupported,
}

#[derive(Clone, Copy)]
enum FieldHandler {
    Connection,
    TransferEncoding,
    ContentLength,
    Host,
    Cookie,
    ContentType,
}

static FIELDS: phf::Map<&'static str, FieldHandler> = phf_map! {
    "connection" => FieldHandler::Connection,
    "transfer-encoding" => FieldHandler::TransferEncoding,
    "content-length" => FieldHandler::ContentLength,
    "host" => FieldHandler::Host,
    "cookie" => FieldHandler::Cookie,
    "content-type" => FieldHandler::ContentType,
};

/// Runs every parsed field through its handler, updating the request
/// record and the connection's keepalive/transfer-encoding state.
/// A semantic failure yields the status to answer with.
pub fn process(
    req: &mut Request,
    keepalive: &mut bool,
    te: &mut TransferEncoding,
) -> Result<(), u16> {
    for n in 0..req.fields.len() {
        let mut lower: SmallVec<[u8; 32]> = SmallVec::new();
        lower.extend(req.fields[n].name.bytes().map(|b| b.to_ascii_lowercase()));

        let Ok(key) = std::str::from_utf8(&lower) else {
            continue;
        };
        let Some(handler) = FIELDS.get(key) else {
            continue;
        };

        trace!(field = %req.fields[n].name, "field dispatch");

        let value = &req.fields[n].value;

        match handler {
            FieldHandler::Connection => {
                if value.as_slice() == b"close" {
                    *keepalive = false;
                }
            }

            FieldHandler::TransferEncoding => {
                *te = if value.as_slice() == b"chunked" {
                    TransferEncoding::Chunked
                } else {
                    TransferEncoding::Unsupported
                };
            }

            FieldHandler::ContentLength => {
                let Some(n) = parse_content_length(value) else {
                    return Err(status::BAD_REQUEST);
                };
                req.content_length = Some(n);
            }

            FieldHandler::Host => req.host = Some(value.clone()),
            FieldHandler::Cookie => req.cookie = Some(value.clone()),
            FieldHandler::ContentType => req.content_type = Some(value.clone()),
        }
    }

    Ok(())
}

fn parse_content_length(value: &[u8]) -> Option<u64> {
    if value.is_empty() {
        return None;
    }

    let mut n: u64 = 0;
    for &b in value {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.checked_mul(10)?.checked_add(u64::from(d))?;
    }

    Some(n)
}
