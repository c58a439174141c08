//! # JSON Parser
//!
//! A strict, single-pass recursive parser producing arena-allocated
//! [`Value`] trees.
//!
//! ## Design Goals
//!
//! 1. **Exactly-sized containers**: objects and arrays are collected
//!    into temporaries and laid out as count-exact arena slices.
//! 2. **Two-pass strings**: the first pass finds the closing quote and
//!    counts escape surplus, which fixes the decoded size before a
//!    single byte is copied; the second pass decodes straight into the
//!    inline buffer or the arena.
//! 3. **Integers only**: the number grammar stops at the digit run;
//!    fraction and exponent suffixes are rejected.
//!
//! ## Failure Modes
//!
//! Truncated input, unexpected bytes, integer overflow, invalid
//! escapes, invalid surrogate pairs and duplicate object keys all fail
//! the parse; the error message carries the byte position for logs,
//! but callers are expected to treat any failure as "parse failed".

use bumpalo::Bump;
use eyre::{bail, Result};
use hashbrown::HashSet;

use super::value::{Member, Value, SHORT_STRING_SIZE};

/// Parses one JSON document into `arena`.
///
/// The input must contain exactly one top-level value surrounded only
/// by whitespace.
pub fn parse<'a>(input: &[u8], arena: &'a Bump) -> Result<Value<'a>> {
    let mut p = Parser {
        input,
        pos: 0,
        arena,
    };

    p.skip_space();
    if p.pos == p.input.len() {
        bail!("empty input");
    }

    let value = p.parse_value()?;

    p.skip_space();
    if p.pos != p.input.len() {
        bail!("trailing bytes at position {}", p.pos);
    }

    Ok(value)
}

struct Parser<'a, 'b> {
    input: &'b [u8],
    pos: usize,
    arena: &'a Bump,
}

impl<'a> Parser<'a, '_> {
    fn skip_space(&mut self) {
        while let Some(&b) = self.input.get(self.pos) {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                _ => break,
            }
        }
    }

    fn parse_value(&mut self) -> Result<Value<'a>> {
        match self.input[self.pos] {
            b'{' => self.parse_object(),
            b'[' => self.parse_array(),
            b'"' => self.parse_string(),
            b't' => {
                self.literal(b"true")?;
                Ok(Value::Bool(true))
            }
            b'f' => {
                self.literal(b"false")?;
                Ok(Value::Bool(false))
            }
            b'n' => {
                self.literal(b"null")?;
                Ok(Value::Null)
            }
            b'-' | b'0'..=b'9' => self.parse_number(),
            b => bail!("unexpected byte 0x{:02x} at position {}", b, self.pos),
        }
    }

    fn literal(&mut self, word: &[u8]) -> Result<()> {
        if self.input.get(self.pos..self.pos + word.len()) == Some(word) {
            self.pos += word.len();
            return Ok(());
        }
        bail!("invalid literal at position {}", self.pos);
    }

    fn parse_object(&mut self) -> Result<Value<'a>> {
        self.pos += 1;
        self.skip_space();

        if self.pos == self.input.len() {
            bail!("truncated object");
        }

        // Insertion order is preserved by the member list; the set only
        // exists to reject duplicate keys.
        let mut members: Vec<Member<'a>> = Vec::new();
        let mut seen: HashSet<Vec<u8>> = HashSet::new();

        if self.input[self.pos] != b'}' {
            loop {
                if self.input[self.pos] != b'"' {
                    bail!("expected object key at position {}", self.pos);
                }

                let name = self.parse_string()?;
                let key = name.string_bytes().unwrap_or_default().to_vec();
                if !seen.insert(key) {
                    bail!("duplicate object key at position {}", self.pos);
                }

                self.skip_space();
                if self.input.get(self.pos) != Some(&b':') {
                    bail!("expected ':' at position {}", self.pos);
                }
                self.pos += 1;

                self.skip_space();
                if self.pos == self.input.len() {
                    bail!("truncated object");
                }

                let value = self.parse_value()?;
                members.push(Member { name, value });

                self.skip_space();
                match self.input.get(self.pos) {
                    Some(b'}') => break,
                    Some(b',') => {
                        self.pos += 1;
                        self.skip_space();
                        if self.pos == self.input.len() {
                            bail!("truncated object");
                        }
                    }
                    _ => bail!("expected ',' or '}}' at position {}", self.pos),
                }
            }
        }

        self.pos += 1;
        Ok(Value::Object(self.arena.alloc_slice_copy(&members)))
    }

    fn parse_array(&mut self) -> Result<Value<'a>> {
        self.pos += 1;
        self.skip_space();

        if self.pos == self.input.len() {
            bail!("truncated array");
        }

        let mut elements: Vec<Value<'a>> = Vec::new();

        if self.input[self.pos] != b']' {
            loop {
                let value = self.parse_value()?;
                elements.push(value);

                self.skip_space();
                match self.input.get(self.pos) {
                    Some(b']') => break,
                    Some(b',') => {
                        self.pos += 1;
                        self.skip_space();
                        if self.pos == self.input.len() {
                            bail!("truncated array");
                        }
                    }
                    _ => bail!("expected ',' or ']' at position {}", self.pos),
                }
            }
        }

        self.pos += 1;
        Ok(Value::Array(self.arena.alloc_slice_copy(&elements)))
    }

    /// First pass: scan to the closing quote, validating escapes and
    /// counting the bytes the decoded form saves over the raw form.
    /// Each short escape saves one byte; each `\uXXXX` saves at least
    /// three. The decoded size fixed by this pass is an upper bound
    /// (surrogate pairs tighten it), which is enough to pick the
    /// representation and size the allocation.
    fn parse_string(&mut self) -> Result<Value<'a>> {
        let start = self.pos + 1;
        let mut surplus = 0usize;
        let mut i = start;
        let mut escaped = false;

        loop {
            let Some(&b) = self.input.get(i) else {
                bail!("unterminated string at position {}", start - 1);
            };

            if escaped {
                match b {
                    b'"' | b'\\' | b'/' | b'n' | b'r' | b't' | b'b' | b'f' => surplus += 1,
                    b'u' => {
                        for k in 1..=4 {
                            match self.input.get(i + k) {
                                Some(h) if h.is_ascii_hexdigit() => {}
                                _ => bail!("invalid \\u escape at position {}", i - 1),
                            }
                        }
                        surplus += 3;
                        i += 4;
                    }
                    _ => bail!("invalid escape at position {}", i - 1),
                }
                escaped = false;
            } else {
                match b {
                    b'"' => break,
                    b'\\' => escaped = true,
                    b if b < 0x20 => bail!("control byte in string at position {}", i),
                    _ => {}
                }
            }

            i += 1;
        }

        let raw = &self.input[start..i];
        let size = raw.len() - surplus;
        self.pos = i + 1;

        if surplus == 0 {
            let s = std::str::from_utf8(raw)
                .map_err(|_| eyre::eyre!("invalid UTF-8 in string at position {}", start))?;
            return Ok(Value::string(s, self.arena));
        }

        if size <= SHORT_STRING_SIZE {
            let mut buf = [0u8; SHORT_STRING_SIZE];
            let n = decode_escapes(raw, &mut buf)?;
            let s = std::str::from_utf8(&buf[..n])
                .map_err(|_| eyre::eyre!("invalid UTF-8 in string at position {}", start))?;
            // Decoding never grows, so the inline form always fits here.
            Ok(Value::string(s, self.arena))
        } else {
            let dst = self.arena.alloc_slice_fill_copy(size, 0u8);
            let n = decode_escapes(raw, dst)?;
            let s = std::str::from_utf8(&dst[..n])
                .map_err(|_| eyre::eyre!("invalid UTF-8 in string at position {}", start))?;
            Ok(Value::Str(s))
        }
    }

    fn parse_number(&mut self) -> Result<Value<'a>> {
        const CUTOFF: u64 = i64::MAX as u64 / 10;
        const CUTLIM: u64 = i64::MAX as u64 % 10;

        let start = self.pos;
        let negative = self.input[self.pos] == b'-';
        if negative {
            self.pos += 1;
        }

        let digits = self.pos;
        let mut integer: u64 = 0;

        while let Some(&b) = self.input.get(self.pos) {
            let d = b.wrapping_sub(b'0');
            if d > 9 {
                break;
            }
            let d = u64::from(d);

            if integer >= CUTOFF && (integer > CUTOFF || d > CUTLIM) {
                bail!("integer overflow at position {}", start);
            }

            integer = integer * 10 + d;
            self.pos += 1;
        }

        if self.pos == digits {
            bail!("expected digits at position {}", self.pos);
        }

        if self.pos > digits + 1 && self.input[digits] == b'0' {
            bail!("leading zero at position {}", digits);
        }

        // The float grammar is deliberately dead: configuration numbers
        // are integers.
        if let Some(&b) = self.input.get(self.pos) {
            if b == b'.' || b == b'e' || b == b'E' {
                bail!("non-integer number at position {}", start);
            }
        }

        let num = integer as i64;
        Ok(Value::Int(if negative { num.wrapping_neg() } else { num }))
    }
}

fn hex_val(b: u8) -> u32 {
    match b {
        b'0'..=b'9' => u32::from(b - b'0'),
        b'a'..=b'f' => u32::from(b - b'a' + 10),
        _ => u32::from(b - b'A' + 10),
    }
}

/// Second pass: decode a scanned raw string (known to be well-formed)
/// into `dst`, returning the decoded length.
fn decode_escapes(raw: &[u8], dst: &mut [u8]) -> Result<usize> {
    let mut s = 0usize;
    let mut i = 0usize;

    while i < raw.len() {
        let b = raw[i];
        i += 1;

        if b != b'\\' {
            dst[s] = b;
            s += 1;
            continue;
        }

        let e = raw[i];
        i += 1;

        let plain = match e {
            b'"' | b'\\' | b'/' => e,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'b' => 0x08,
            b'f' => 0x0c,
            b'u' => {
                let mut code: u32 = 0;
                for _ in 0..4 {
                    code = (code << 4) + hex_val(raw[i]);
                    i += 1;
                }

                if (0xdc00..=0xdfff).contains(&code) {
                    bail!("orphan low surrogate");
                }

                if (0xd800..=0xdbff).contains(&code) {
                    if raw.get(i) != Some(&b'\\') || raw.get(i + 1) != Some(&b'u') {
                        bail!("unpaired high surrogate");
                    }
                    i += 2;

                    let mut low: u32 = 0;
                    for _ in 0..4 {
                        low = (low << 4) + hex_val(raw[i]);
                        i += 1;
                    }

                    if !(0xdc00..=0xdfff).contains(&low) {
                        bail!("unpaired high surrogate");
                    }

                    code = ((code - 0xd800) << 10) + (low - 0xdc00) + 0x10000;
                }

                let Some(ch) = char::from_u32(code) else {
                    bail!("invalid code point U+{:04X}", code);
                };
                s += ch.encode_utf8(&mut dst[s..]).len();
                continue;
            }
            _ => unreachable!("escape validated by the scan pass"),
        };

        dst[s] = plain;
        s += 1;
    }

    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> bool {
        let arena = Bump::new();
        parse(input.as_bytes(), &arena).is_ok()
    }

    #[test]
    fn top_level_values() {
        assert!(parse_ok("null"));
        assert!(parse_ok("true"));
        assert!(parse_ok("false"));
        assert!(parse_ok("42"));
        assert!(parse_ok("\"s\""));
        assert!(parse_ok("[]"));
        assert!(parse_ok("{}"));
        assert!(parse_ok("  {\"a\": 1}\r\n"));
    }

    #[test]
    fn trailing_bytes_rejected() {
        assert!(!parse_ok("1 2"));
        assert!(!parse_ok("{} x"));
        assert!(!parse_ok("truex"));
    }

    #[test]
    fn integer_limits() {
        let arena = Bump::new();
        let v = parse(b"9223372036854775807", &arena).unwrap();
        assert_eq!(v.as_int(), Some(i64::MAX));

        assert!(!parse_ok("9223372036854775808"));
        assert!(!parse_ok("-9223372036854775809"));
    }

    #[test]
    fn number_grammar() {
        assert!(!parse_ok("01"));
        assert!(!parse_ok("-"));
        assert!(!parse_ok("1.5"));
        assert!(!parse_ok("1e5"));
        assert!(!parse_ok("1E5"));
        assert!(parse_ok("0"));
        assert!(parse_ok("-0"));
    }

    #[test]
    fn string_representation_boundary() {
        let arena = Bump::new();
        let v = parse(b"\"12345678901234\"", &arena).unwrap();
        assert!(matches!(v, Value::Short(_)));

        let v = parse(b"\"123456789012345\"", &arena).unwrap();
        assert!(matches!(v, Value::Str(_)));
    }

    #[test]
    fn escapes_decode() {
        let arena = Bump::new();
        let v = parse(br#""a\n\t\"\\\/b""#, &arena).unwrap();
        assert_eq!(v.as_str(), Some("a\n\t\"\\/b"));
    }

    #[test]
    fn unicode_escape() {
        let arena = Bump::new();
        let v = parse(br#""\u0041\u00e9""#, &arena).unwrap();
        assert_eq!(v.as_str(), Some("A\u{e9}"));

        let v = parse(br#""\u00E9""#, &arena).unwrap();
        assert_eq!(v.as_str(), Some("\u{e9}"));
    }

    #[test]
    fn surrogate_pair() {
        let arena = Bump::new();
        let v = parse(br#""\uD834\uDD1E""#, &arena).unwrap();
        assert_eq!(v.string_bytes(), Some(&[0xf0, 0x9d, 0x84, 0x9e][..]));
    }

    #[test]
    fn broken_surrogates_rejected() {
        assert!(!parse_ok(r#""\uD834""#));
        assert!(!parse_ok(r#""\uD834x""#));
        assert!(!parse_ok(r#""\uD834A""#));
        assert!(!parse_ok(r#""\uDD1E""#));
    }

    #[test]
    fn control_bytes_rejected() {
        assert!(!parse_ok("\"a\nb\""));
        assert!(!parse_ok("\"a\x01b\""));
    }

    #[test]
    fn duplicate_keys_rejected() {
        assert!(!parse_ok(r#"{"a": 1, "a": 2}"#));
        assert!(parse_ok(r#"{"a": 1, "b": {"a": 2}}"#));
    }

    #[test]
    fn member_order_preserved() {
        let arena = Bump::new();
        let v = parse(br#"{"z": 1, "a": 2, "m": 3}"#, &arena).unwrap();
        let names: Vec<_> = v
            .as_object()
            .unwrap()
            .iter()
            .map(|m| m.name.as_str().unwrap())
            .collect();
        assert_eq!(names, ["z", "a", "m"]);
    }

    #[test]
    fn nested_document() {
        let arena = Bump::new();
        let v = parse(
            br#"{"listeners": {"*:8080": {"application": "app"}}, "limits": [1, -2, 3]}"#,
            &arena,
        )
        .unwrap();
        let members = v.as_object().unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[1].value.as_array().unwrap().len(), 3);
        assert_eq!(members[1].value.as_array().unwrap()[1].as_int(), Some(-2));
    }
}
