//! Leaf-level primitives shared by every xchecker crate: identifier validation,
//! path-traversal guards, atomic file writes, exit codes, bounded output capture
//! and the logging setup. Nothing in this crate depends on another xchecker crate.

pub mod atomic_write;
pub mod exit_codes;
pub mod identifiers;
pub mod logging;
pub mod paths;
pub mod ring_buffer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;
