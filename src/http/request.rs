//! # Request and Response Records
//!
//! The parsed request handed to the upper layer, the response it hands
//! back, and the [`Handler`] seam between the connection core and
//! whatever dispatches requests above it.

use bytes::Bytes;

/// One parsed header field, exactly as received.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub value: Vec<u8>,
}

/// A parsed request. Fields recognized by the dispatch table are also
/// broken out for the upper layer's convenience.
#[derive(Debug, Default, Clone)]
pub struct Request {
    pub method: String,
    pub target: String,
    /// Minor version digit; `1` for HTTP/1.1, `0` for HTTP/1.0.
    pub version_minor: u8,
    pub fields: Vec<Field>,

    pub host: Option<Vec<u8>>,
    pub cookie: Option<Vec<u8>>,
    pub content_type: Option<Vec<u8>>,
    /// Parsed `Content-Length`; `None` when the field is absent.
    pub content_length: Option<u64>,

    /// Body bytes, exactly `content_length` of them, once read.
    pub body: Option<Vec<u8>>,
}

/// A chain of response body buffers. `last` marks the end of the
/// response; chunked framing needs it to emit the terminator.
#[derive(Debug, Default)]
pub struct Chain {
    pub bufs: Vec<Bytes>,
    pub last: bool,
}

impl Chain {
    /// A complete body in one buffer.
    pub fn whole(body: impl Into<Bytes>) -> Self {
        Self {
            bufs: vec![body.into()],
            last: true,
        }
    }

    /// An empty, complete body.
    pub fn empty() -> Self {
        Self {
            bufs: Vec::new(),
            last: true,
        }
    }

    pub fn len(&self) -> usize {
        self.bufs.iter().map(Bytes::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One response header field; `skip` suppresses serialization without
/// removing the field from the record.
#[derive(Debug, Clone)]
pub struct ResponseField {
    pub name: String,
    pub value: Vec<u8>,
    pub skip: bool,
}

/// The upper layer's answer to one request.
///
/// When `content_length` is `None`, the response has no framing of its
/// own: HTTP/1.1 clients get chunked transfer encoding, HTTP/1.0
/// clients get a close-delimited body.
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub fields: Vec<ResponseField>,
    pub content_length: Option<u64>,
    pub body: Chain,
}

impl Response {
    /// A response with a known length: `Content-Length` is emitted and
    /// the body is the chain's bytes.
    pub fn with_body(status: u16, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self {
            status,
            fields: Vec::new(),
            content_length: Some(body.len() as u64),
            body: Chain::whole(body),
        }
    }

    /// A bodyless response with `Content-Length: 0`.
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            fields: Vec::new(),
            content_length: Some(0),
            body: Chain::empty(),
        }
    }

    /// A response framed by the transfer encoding (chunked on HTTP/1.1,
    /// close-delimited on HTTP/1.0).
    pub fn streamed(status: u16, body: Chain) -> Self {
        Self {
            status,
            fields: Vec::new(),
            content_length: None,
            body,
        }
    }

    pub fn field(mut self, name: &str, value: impl Into<Vec<u8>>) -> Self {
        self.fields.push(ResponseField {
            name: name.to_string(),
            value: value.into(),
            skip: false,
        });
        self
    }
}

/// The seam to the layer above the connection: dispatch, routing,
/// application logic. The core calls [`Handler::ready`] once per
/// parsed request and frames whatever comes back.
pub trait Handler {
    fn ready(&mut self, req: &Request) -> Response;

    /// Called when a request dies without a normal response: parse
    /// failures, timeouts, resource exhaustion. The status is the one
    /// sent to the client, or `0` when the connection closed raw.
    fn error(&mut self, _status: u16) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_accounting() {
        let chain = Chain {
            bufs: vec![Bytes::from_static(b"abc"), Bytes::from_static(b"de")],
            last: true,
        };
        assert_eq!(chain.len(), 5);
        assert!(!chain.is_empty());
        assert!(Chain::empty().is_empty());
    }

    #[test]
    fn response_builders() {
        let r = Response::with_body(200, &b"hello"[..]);
        assert_eq!(r.content_length, Some(5));

        let r = Response::empty(204);
        assert_eq!(r.content_length, Some(0));
        assert!(r.body.last);

        let r = Response::streamed(200, Chain::whole(&b"x"[..]));
        assert!(r.content_length.is_none());
    }
}
