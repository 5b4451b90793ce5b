//! xchecker — orchestration core for spec-driven feature automation: a
//! phase FSM, workstream scheduling, context hydration, scope/contract
//! enforcement and attestation, fronted by a single CLI binary.
//!
//! This crate is a thin shell: argument parsing and command dispatch live
//! in `sdp-cli`, and every subsystem (checkpoint, hydration, hooks,
//! constraints, executor, orchestrator, status, contracts, boundary) is its
//! own workspace member. `cli` wires a process around `sdp_cli::execute`;
//! `error` folds the result into exit codes.

pub mod cli;
pub mod error;

pub use error::{ErrorCategory, UserFriendlyError, XCheckerError};
