//! # Configuration Value Engine
//!
//! An in-memory tree representation of JSON configuration documents,
//! together with everything needed to serve and edit them: a strict
//! parser, slash-path lookup, an overlay-patch compiler and executor,
//! and a two-pass printer.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   parse    ┌─────────────┐   print    ┌────────────┐
//! │ JSON bytes │──────────> │  Value tree │──────────> │ JSON bytes │
//! └────────────┘            └─────────────┘            └────────────┘
//!                             │        ▲
//!                   get_value │        │ clone_value
//!                     compile ▼        │ (structural copy)
//!                           ┌─────────────┐
//!                           │   op-chain  │
//!                           └─────────────┘
//! ```
//!
//! ## Arena Discipline
//!
//! Every tree lives in a `bumpalo` arena and is dropped by dropping the
//! arena; there is no per-value free. The patch executor allocates the
//! modified spine into the *same* arena as the source tree and
//! references every untouched subtree, so the new tree is valid for
//! exactly as long as the old one - which is the arena's lifetime.
//!
//! ## Strictness
//!
//! The accepted JSON is a strict subset of RFC 8259: integers only (no
//! decimals, no exponents), duplicate object keys rejected, control
//! bytes in strings rejected, exactly one top-level value.

mod ops;
mod parse;
mod path;
mod print;
mod value;

pub use ops::{clone_value, compile, Compiled, Op, OpAction};
pub use parse::parse;
pub use path::{get_value, object_get_member};
pub use print::print;
pub use value::{Member, ShortStr, Value, SHORT_STRING_SIZE};
