//! # Overlay Patches
//!
//! Editing a configuration tree is a two-step protocol: [`compile`]
//! turns a path plus an optional new value into an **op-chain**, and
//! [`clone_value`] executes the chain while structurally copying the
//! tree. Ops and the patched tree land in the same arena as the
//! source, so the old and new trees share one lifetime - which is what
//! allows the copy to reference untouched subtrees instead of
//! duplicating them.
//!
//! ## Op-Chain Shape
//!
//! One op per path segment. Intermediate segments become `Pass` ops
//! carrying the chain for the next level; the terminal segment is
//! `Create`, `Replace` or `Delete`. The `next` link chains sibling
//! edits within one object level in ascending index order; the
//! compiler itself only ever emits single-path chains.
//!
//! ```text
//! /a/b = 7        Pass{index: a}
//!                   └ ctx ─> Replace{index: b, value: 7}
//! ```
//!
//! ## Copy Semantics
//!
//! - Members the chain does not touch are copied **verbatim**: a plain
//!   struct copy that shares the member's entire subtree.
//! - Member names along the chain are re-allocated into the arena.
//! - `Create` appends at the end of the object; `Replace` and `Delete`
//!   act at the member's original position; relative order of the
//!   surviving members is preserved.
//! - Ops only traverse objects; a chain that reaches a non-object is
//!   an error.

use bumpalo::Bump;
use eyre::{bail, Result};
use smallvec::SmallVec;

use super::path::{object_get_member, PathParse};
use super::value::{Member, Value};

/// One edit instruction. `index` addresses a member of the object the
/// op applies to.
#[derive(Debug, Clone, Copy)]
pub struct Op<'a> {
    pub index: u32,
    pub action: OpAction<'a>,
    pub next: Option<&'a Op<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub enum OpAction<'a> {
    /// Descend into the member at `index`; the payload is the chain
    /// for the nested object.
    Pass(Option<&'a Op<'a>>),
    /// Append this member at the end of the object.
    Create(Member<'a>),
    /// Keep the member's name, substitute this value.
    Replace(Value<'a>),
    /// Drop the member at `index`.
    Delete,
}

/// Outcome of compiling a patch.
#[derive(Debug, Clone, Copy)]
pub enum Compiled<'a> {
    Ops(&'a Op<'a>),
    /// The path cannot be resolved: an intermediate segment is missing,
    /// or a delete targets a member that does not exist. A negative
    /// result, not an error.
    Declined,
}

/// Compiles `path` plus an optional new value into an op-chain against
/// `root`. `value: None` requests a delete.
pub fn compile<'a>(
    root: Value<'a>,
    value: Option<Value<'a>>,
    path: &str,
    arena: &'a Bump,
) -> Compiled<'a> {
    let mut parse = PathParse::new(path);
    let mut current = Some(root);

    // (member index, segment) per level; the terminal entry is last.
    let mut levels: SmallVec<[(u32, &str); 8]> = SmallVec::new();

    loop {
        let token = parse.next_token();
        // Tokens come from a &str and split on '/', so they stay UTF-8.
        let segment = std::str::from_utf8(token).unwrap_or_default();

        let found = current.and_then(|v| object_get_member(v, token));
        let index = found.map(|(n, _)| n as u32).unwrap_or(0);
        current = found.map(|(_, v)| v);

        levels.push((index, segment));

        if parse.last {
            break;
        }

        if current.is_none() {
            return Compiled::Declined;
        }
    }

    let (term_index, term_segment) = levels[levels.len() - 1];

    let action = match value {
        None => {
            if current.is_none() {
                return Compiled::Declined;
            }
            OpAction::Delete
        }
        Some(value) if current.is_none() => OpAction::Create(Member {
            name: Value::string(term_segment, arena),
            value,
        }),
        Some(value) => OpAction::Replace(value),
    };

    let mut op: &'a Op<'a> = arena.alloc(Op {
        index: term_index,
        action,
        next: None,
    });

    for &(index, _) in levels[..levels.len() - 1].iter().rev() {
        op = arena.alloc(Op {
            index,
            action: OpAction::Pass(Some(op)),
            next: None,
        });
    }

    Compiled::Ops(op)
}

/// Structurally copies `src` into `arena`, applying `op` along the way.
///
/// With `op: None` this is a plain tree duplication. Untouched members
/// of patched objects are shared with the source tree.
pub fn clone_value<'a>(src: Value<'a>, op: Option<&Op<'a>>, arena: &'a Bump) -> Result<Value<'a>> {
    if op.is_some() && src.as_object().is_none() {
        bail!("patch op applied to a non-object value");
    }

    match src {
        Value::Null | Value::Bool(_) | Value::Int(_) | Value::Short(_) => Ok(src),

        Value::Str(s) => Ok(Value::Str(arena.alloc_str(s))),

        Value::Array(elements) => {
            let mut copy: Vec<Value<'a>> = Vec::with_capacity(elements.len());
            for element in elements {
                copy.push(clone_value(*element, None, arena)?);
            }
            Ok(Value::Array(arena.alloc_slice_copy(&copy)))
        }

        Value::Object(members) => copy_object(members, op, arena),
    }
}

fn copy_name<'a>(name: Value<'a>, arena: &'a Bump) -> Value<'a> {
    match name {
        Value::Str(s) => Value::Str(arena.alloc_str(s)),
        _ => name,
    }
}

fn copy_object<'a>(
    src: &'a [Member<'a>],
    op: Option<&Op<'a>>,
    arena: &'a Bump,
) -> Result<Value<'a>> {
    let mut count = src.len();
    if let Some(op) = op {
        match op.action {
            OpAction::Create(_) => count += 1,
            OpAction::Delete => count -= 1,
            _ => {}
        }
    }

    let mut dst: Vec<Member<'a>> = Vec::with_capacity(count);
    let mut s = 0usize;
    let mut current = op;

    while let Some(op) = current {
        let index = match op.action {
            OpAction::Create(_) => src.len(),
            _ => op.index as usize,
        };

        if index < s || index >= src.len() + 1 || (index == src.len() && !matches!(op.action, OpAction::Create(_))) {
            bail!("malformed op-chain: index {} out of order", index);
        }

        // Members below the op's index are untouched: share them.
        dst.extend_from_slice(&src[s..index]);
        s = index;

        match op.action {
            OpAction::Pass(nested) => {
                let member = &src[s];
                dst.push(Member {
                    name: copy_name(member.name, arena),
                    value: clone_value(member.value, nested, arena)?,
                });
                s += 1;
            }

            OpAction::Create(member) => {
                dst.push(Member {
                    name: copy_name(member.name, arena),
                    value: member.value,
                });
            }

            OpAction::Replace(value) => {
                dst.push(Member {
                    name: copy_name(src[s].name, arena),
                    value,
                });
                s += 1;
            }

            OpAction::Delete => {
                s += 1;
            }
        }

        current = op.next;
    }

    dst.extend_from_slice(&src[s..]);

    debug_assert_eq!(dst.len(), count);

    Ok(Value::Object(arena.alloc_slice_copy(&dst)))
}
