//! # JSON Printer
//!
//! Serializes a [`Value`] tree in two passes: the first computes a
//! byte count, the second writes into a buffer reserved to exactly
//! that count. The measured count is exact for compact output and an
//! upper bound in pretty mode (separator commas and optional blank
//! lines are reserved unconditionally), so the writer never grows the
//! buffer.
//!
//! Pretty output indents with one tab per nesting level and uses CRLF
//! newlines. A blank line separates a member whose value ended as a
//! non-empty object or array from the member that follows it, which
//! keeps large configuration sections visually apart.

use super::value::Value;

/// Indentation and spacing state threaded through pretty printing.
#[derive(Default)]
struct Pretty {
    level: usize,
    more_space: bool,
}

/// Serializes `value`, optionally in pretty mode.
pub fn print(value: Value<'_>, pretty: bool) -> Vec<u8> {
    let size = if pretty {
        value_len(value, &mut Some(Pretty::default()))
    } else {
        value_len(value, &mut None)
    };

    let mut out = Vec::with_capacity(size);

    if pretty {
        write_value(&mut out, value, &mut Some(Pretty::default()));
    } else {
        write_value(&mut out, value, &mut None);
    }

    debug_assert!(out.len() <= size);
    out
}

fn newline(out: &mut Vec<u8>) {
    out.extend_from_slice(b"\r\n");
}

fn indentation(out: &mut Vec<u8>, pretty: &Pretty) {
    out.resize(out.len() + pretty.level, b'\t');
}

fn value_len(value: Value<'_>, pretty: &mut Option<Pretty>) -> usize {
    match value {
        Value::Null => "null".len(),
        Value::Bool(true) => "true".len(),
        Value::Bool(false) => "false".len(),
        Value::Int(num) => int_len(num),
        Value::Short(_) | Value::Str(_) => string_len(value),
        Value::Array(elements) => {
            let mut len = 2;

            if let Some(p) = pretty {
                p.level += 1;
            }

            for element in elements {
                len += value_len(*element, pretty);
                if let Some(p) = pretty {
                    // indentation and newline
                    len += p.level + 2;
                }
            }

            if let Some(p) = pretty {
                p.level -= 1;
                if !elements.is_empty() {
                    len += p.level + 2;
                }
            }

            // one comma reserved per element
            len + elements.len()
        }
        Value::Object(members) => {
            let mut len = 2;

            if let Some(p) = pretty {
                p.level += 1;
            }

            for member in members {
                len += string_len(member.name) + 1 + value_len(member.value, pretty) + 1;
                if let Some(p) = pretty {
                    // indentation, space after ':', newline, and a
                    // possible blank line before the next member
                    len += p.level + 1 + 2 + 2;
                }
            }

            if let Some(p) = pretty {
                p.level -= 1;
                len += p.level + 2;
            }

            len
        }
    }
}

fn write_value(out: &mut Vec<u8>, value: Value<'_>, pretty: &mut Option<Pretty>) {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Int(num) => {
            let mut buf = [0u8; 20];
            out.extend_from_slice(format_int(num, &mut buf));
        }
        Value::Short(_) | Value::Str(_) => write_string(out, value),
        Value::Array(elements) => {
            out.push(b'[');

            if !elements.is_empty() {
                if let Some(p) = pretty {
                    newline(out);
                    p.level += 1;
                    indentation(out, p);
                }

                write_value(out, elements[0], pretty);

                for element in &elements[1..] {
                    out.push(b',');

                    if let Some(p) = pretty {
                        newline(out);
                        indentation(out, p);
                        p.more_space = false;
                    }

                    write_value(out, *element, pretty);
                }

                if let Some(p) = pretty {
                    newline(out);
                    p.level -= 1;
                    indentation(out, p);
                    p.more_space = true;
                }
            }

            out.push(b']');
        }
        Value::Object(members) => {
            out.push(b'{');

            if !members.is_empty() {
                if let Some(p) = pretty {
                    newline(out);
                    p.level += 1;
                }

                for (n, member) in members.iter().enumerate() {
                    if n != 0 {
                        out.push(b',');

                        if let Some(p) = pretty {
                            newline(out);
                            if p.more_space {
                                p.more_space = false;
                                newline(out);
                            }
                        }
                    }

                    if let Some(p) = pretty {
                        indentation(out, p);
                    }

                    write_string(out, member.name);
                    out.push(b':');

                    if pretty.is_some() {
                        out.push(b' ');
                    }

                    write_value(out, member.value, pretty);
                }

                if let Some(p) = pretty {
                    newline(out);
                    p.level -= 1;
                    indentation(out, p);
                    p.more_space = true;
                }
            }

            out.push(b'}');
        }
    }
}

/// Decimal width classes for the measuring pass; the widest class is
/// the full `i64` minimum.
fn int_len(num: i64) -> usize {
    let abs = num.unsigned_abs();

    if abs <= 9999 {
        "-9999".len()
    } else if abs <= 99_999_999_999 {
        "-99999999999".len()
    } else {
        "-9223372036854775808".len()
    }
}

/// Formats `num` into `buf` back to front, returning the used slice.
fn format_int(num: i64, buf: &mut [u8; 20]) -> &[u8] {
    let negative = num < 0;
    let mut abs = num.unsigned_abs();
    let mut i = buf.len();

    loop {
        i -= 1;
        buf[i] = b'0' + (abs % 10) as u8;
        abs /= 10;
        if abs == 0 {
            break;
        }
    }

    if negative {
        i -= 1;
        buf[i] = b'-';
    }

    &buf[i..]
}

fn string_len(value: Value<'_>) -> usize {
    let bytes = value.string_bytes().unwrap_or_default();
    2 + bytes.len() + escape_len(bytes)
}

fn write_string(out: &mut Vec<u8>, value: Value<'_>) {
    let bytes = value.string_bytes().unwrap_or_default();
    out.push(b'"');
    write_escaped(out, bytes);
    out.push(b'"');
}

/// Extra bytes escaping adds on top of the raw length.
fn escape_len(bytes: &[u8]) -> usize {
    let mut len = 0;

    for &b in bytes {
        if b == b'\\' || b == b'"' {
            len += 1;
        } else if b <= 0x1f {
            match b {
                b'\n' | b'\r' | b'\t' | 0x08 | 0x0c => len += 1,
                _ => len += "\\u001F".len() - 1,
            }
        }
    }

    len
}

fn write_escaped(out: &mut Vec<u8>, bytes: &[u8]) {
    for &b in bytes {
        if b > 0x1f {
            if b == b'\\' || b == b'"' {
                out.push(b'\\');
            }
            out.push(b);
        } else {
            out.push(b'\\');
            match b {
                b'\n' => out.push(b'n'),
                b'\r' => out.push(b'r'),
                b'\t' => out.push(b't'),
                0x08 => out.push(b'b'),
                0x0c => out.push(b'f'),
                _ => {
                    out.extend_from_slice(b"u00");
                    out.push(b'0' + (b >> 4));
                    let low = b & 0xf;
                    out.push(if low < 10 {
                        b'0' + low
                    } else {
                        b'A' + low - 10
                    });
                }
            }
        }
    }
}
