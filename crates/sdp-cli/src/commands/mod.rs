//! One module per command, mirroring the verbs the §6 interface names.

pub mod advance;
pub mod apply;
pub mod boundary;
mod common;
pub mod contract;
pub mod init;
pub mod status;

pub use common::{load_environment, Environment};
