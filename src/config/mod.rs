//! # Gantry Configuration Module
//!
//! This module centralizes the tunables consumed by the HTTP connection
//! core. Constants are grouped with their interdependencies documented
//! and enforced through compile-time assertions.
//!
//! ## Why Centralization?
//!
//! The header buffer promotion path depends on two sizes and a count
//! staying consistent with each other. Keeping them in one place, next
//! to the assertions that tie them together, prevents mismatch bugs
//! when one of them is tuned.
//!
//! ## Module Organization
//!
//! - [`constants`]: default values and their dependency documentation,
//!   plus [`SocketConf`], the per-listener tuning record.

pub mod constants;

pub use constants::*;
