//! # Path Lookup
//!
//! Slash-delimited paths address members of nested objects: `/a/b/c`
//! names member `c` of object `b` of object `a` of the root. The empty
//! path (and the bare `/`) addresses the root itself. Segments may not
//! contain `/`; there is no escaping.

use super::value::Value;

/// Iterator-like tokenizer over a slash path.
///
/// Mirrors the walk order of the op compiler: each call yields the
/// bytes of the next segment and records whether it was the last one.
pub(crate) struct PathParse<'p> {
    path: &'p [u8],
    pos: usize,
    pub last: bool,
}

impl<'p> PathParse<'p> {
    pub fn new(path: &'p str) -> Self {
        Self {
            path: path.as_bytes(),
            pos: 0,
            last: false,
        }
    }

    pub fn next_token(&mut self) -> &'p [u8] {
        let start = (self.pos + 1).min(self.path.len());
        let mut p = start;

        while p < self.path.len() && self.path[p] != b'/' {
            p += 1;
        }

        self.pos = p;
        self.last = p >= self.path.len();

        &self.path[start..p]
    }
}

/// Looks up the value addressed by `path`, or `None` when the path
/// crosses a non-object or names a missing member.
pub fn get_value<'a>(root: Value<'a>, path: &str) -> Option<Value<'a>> {
    let mut parse = PathParse::new(path);
    let mut value = root;

    loop {
        let token = parse.next_token();

        if token.is_empty() {
            if parse.last {
                break;
            }
            return None;
        }

        value = object_get_member(value, token)?.1;

        if parse.last {
            break;
        }
    }

    Some(value)
}

/// Finds an object member by byte-exact name, returning its index and
/// value. `None` when `value` is not an object or has no such member.
pub fn object_get_member<'a>(value: Value<'a>, name: &[u8]) -> Option<(usize, Value<'a>)> {
    let members = value.as_object()?;

    members
        .iter()
        .enumerate()
        .find(|(_, m)| m.name.string_bytes() == Some(name))
        .map(|(n, m)| (n, m.value))
}
