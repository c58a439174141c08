//! # Incremental Request Parser
//!
//! Parses the request line and header fields out of a connection's
//! read buffer, consuming each completed line and leaving partial
//! input in place. The caller loops: feed more bytes, call again.
//! `Again` with a full buffer is the signal to promote into a larger
//! buffer; the unconsumed residual is at most one incomplete line.
//!
//! The parser stores everything it completes as owned data on the
//! request under construction, so consumed buffer bytes are dead the
//! moment a line is parsed.

use memchr::memchr;

use super::buf::IoBuf;
use super::request::{Field, Request};

/// Outcome of one parse attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseResult {
    /// Request line and all fields parsed; the empty line is consumed.
    Done,
    /// More input needed.
    Again,
    /// Malformed request; maps to 400.
    Invalid,
    /// Well-formed request line with an HTTP version this core does
    /// not speak; maps to 505.
    UnsupportedVersion,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Stage {
    #[default]
    RequestLine,
    Fields,
    Done,
}

/// Restartable parser state; one per connection, reset per request.
#[derive(Debug, Default)]
pub struct RequestParser {
    stage: Stage,
}

impl RequestParser {
    pub fn reset(&mut self) {
        self.stage = Stage::RequestLine;
    }

    pub fn parse(&mut self, buf: &mut IoBuf, req: &mut Request) -> ParseResult {
        loop {
            if self.stage == Stage::Done {
                return ParseResult::Done;
            }

            let outcome = {
                let bytes = buf.bytes();
                let Some(nl) = memchr(b'\n', bytes) else {
                    return ParseResult::Again;
                };

                if nl == 0 || bytes[nl - 1] != b'\r' {
                    return ParseResult::Invalid;
                }

                let line = &bytes[..nl - 1];

                let result = match self.stage {
                    Stage::RequestLine => self.request_line(line, req),
                    Stage::Fields => self.field_line(line, req),
                    Stage::Done => unreachable!(),
                };

                (nl + 1, result)
            };

            buf.advance(outcome.0);

            match outcome.1 {
                ParseResult::Again => continue,
                other => return other,
            }
        }
    }

    fn request_line(&mut self, line: &[u8], req: &mut Request) -> ParseResult {
        let Some(sp1) = memchr(b' ', line) else {
            return ParseResult::Invalid;
        };
        let method = &line[..sp1];

        if method.is_empty() || !method.iter().all(|&b| is_token_byte(b)) {
            return ParseResult::Invalid;
        }

        let rest = &line[sp1 + 1..];
        let Some(sp2) = memchr(b' ', rest) else {
            return ParseResult::Invalid;
        };
        let target = &rest[..sp2];

        if target.is_empty() || target.iter().any(|&b| b < 0x21 || b == 0x7f) {
            return ParseResult::Invalid;
        }

        let version = &rest[sp2 + 1..];

        let minor = match version {
            b"HTTP/1.0" => 0,
            b"HTTP/1.1" => 1,
            [b'H', b'T', b'T', b'P', b'/', major, b'.', digit]
                if major.is_ascii_digit() && digit.is_ascii_digit() =>
            {
                return ParseResult::UnsupportedVersion
            }
            _ => return ParseResult::Invalid,
        };

        req.method = String::from_utf8_lossy(method).into_owned();
        req.target = String::from_utf8_lossy(target).into_owned();
        req.version_minor = minor;

        self.stage = Stage::Fields;
        ParseResult::Again
    }

    fn field_line(&mut self, line: &[u8], req: &mut Request) -> ParseResult {
        if line.is_empty() {
            self.stage = Stage::Done;
            return ParseResult::Done;
        }

        let Some(colon) = memchr(b':', line) else {
            return ParseResult::Invalid;
        };
        let name = &line[..colon];

        if name.is_empty() || !name.iter().all(|&b| is_token_byte(b)) {
            return ParseResult::Invalid;
        }

        let value = trim_ows(&line[colon + 1..]);

        if value.iter().any(|&b| (b < 0x20 && b != b'\t') || b == 0x7f) {
            return ParseResult::Invalid;
        }

        req.fields.push(Field {
            // Token bytes are ASCII.
            name: String::from_utf8_lossy(name).into_owned(),
            value: value.to_vec(),
        });

        ParseResult::Again
    }
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

fn trim_ows(mut value: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = value {
        value = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = value {
        value = rest;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(buf: &mut IoBuf, input: &[u8]) {
        buf.spare_mut()[..input.len()].copy_from_slice(input);
        buf.fill(input.len());
    }

    fn parse_all(input: &[u8]) -> (ParseResult, Request) {
        let mut buf = IoBuf::new(4096);
        feed(&mut buf, input);
        let mut parser = RequestParser::default();
        let mut req = Request::default();
        (parser.parse(&mut buf, &mut req), req)
    }

    #[test]
    fn simple_request() {
        let (result, req) = parse_all(b"GET /config HTTP/1.1\r\nHost: x\r\n\r\n");
        assert_eq!(result, ParseResult::Done);
        assert_eq!(req.method, "GET");
        assert_eq!(req.target, "/config");
        assert_eq!(req.version_minor, 1);
        assert_eq!(req.fields.len(), 1);
        assert_eq!(req.fields[0].name, "Host");
        assert_eq!(req.fields[0].value, b"x");
    }

    #[test]
    fn incremental_feed() {
        let mut buf = IoBuf::new(4096);
        let mut parser = RequestParser::default();
        let mut req = Request::default();

        feed(&mut buf, b"GET / HT");
        assert_eq!(parser.parse(&mut buf, &mut req), ParseResult::Again);

        feed(&mut buf, b"TP/1.1\r\nHo");
        assert_eq!(parser.parse(&mut buf, &mut req), ParseResult::Again);
        assert_eq!(req.method, "GET");

        feed(&mut buf, b"st: a\r\n\r\n");
        assert_eq!(parser.parse(&mut buf, &mut req), ParseResult::Done);
        assert_eq!(req.fields[0].value, b"a");
    }

    #[test]
    fn consumed_lines_leave_residual() {
        let mut buf = IoBuf::new(4096);
        let mut parser = RequestParser::default();
        let mut req = Request::default();

        feed(&mut buf, b"GET / HTTP/1.1\r\nName: value\r\nPartial-Fie");
        assert_eq!(parser.parse(&mut buf, &mut req), ParseResult::Again);
        assert_eq!(buf.bytes(), b"Partial-Fie");
    }

    #[test]
    fn version_gate() {
        assert_eq!(parse_all(b"GET / HTTP/1.0\r\n\r\n").0, ParseResult::Done);
        assert_eq!(
            parse_all(b"GET / HTTP/2.0\r\n\r\n").0,
            ParseResult::UnsupportedVersion
        );
        assert_eq!(
            parse_all(b"GET / HTTP/1.2\r\n\r\n").0,
            ParseResult::UnsupportedVersion
        );
        assert_eq!(parse_all(b"GET / FTP/1.0\r\n\r\n").0, ParseResult::Invalid);
    }

    #[test]
    fn malformed_lines() {
        assert_eq!(parse_all(b"GET /\r\n\r\n").0, ParseResult::Invalid);
        assert_eq!(parse_all(b"GET  / HTTP/1.1\r\n\r\n").0, ParseResult::Invalid);
        assert_eq!(parse_all(b"G@T / HTTP/1.1\r\n\r\n").0, ParseResult::Invalid);
        assert_eq!(
            parse_all(b"GET / HTTP/1.1\nHost: x\r\n\r\n").0,
            ParseResult::Invalid
        );
        assert_eq!(
            parse_all(b"GET / HTTP/1.1\r\nNoColonHere\r\n\r\n").0,
            ParseResult::Invalid
        );
        assert_eq!(
            parse_all(b"GET / HTTP/1.1\r\nBad Name: x\r\n\r\n").0,
            ParseResult::Invalid
        );
    }

    #[test]
    fn field_value_trimming() {
        let (result, req) = parse_all(b"GET / HTTP/1.1\r\nPad: \t a b \t \r\n\r\n");
        assert_eq!(result, ParseResult::Done);
        assert_eq!(req.fields[0].value, b"a b");
    }

    #[test]
    fn pipelined_bytes_stay_buffered() {
        let mut buf = IoBuf::new(4096);
        let mut parser = RequestParser::default();
        let mut req = Request::default();

        feed(
            &mut buf,
            b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n",
        );
        assert_eq!(parser.parse(&mut buf, &mut req), ParseResult::Done);
        assert_eq!(req.target, "/a");
        assert_eq!(buf.bytes(), b"GET /b HTTP/1.1\r\n\r\n");
    }
}
