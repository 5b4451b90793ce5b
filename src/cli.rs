//! Process entry point: parse arguments, initialize logging, dispatch to
//! `sdp-cli`, and render whatever comes back through `UserFriendlyError`.
//! Kept deliberately thin — everything else lives one layer down, in the
//! `sdp-*` crates.

use crate::error::{UserFriendlyError, XCheckerError};
use camino::Utf8PathBuf;
use clap::Parser;
use sdp_cli::Cli;
use sdp_utils::exit_codes::ExitCode;
use sdp_utils::logging::{self, LogFormat};

fn resolve_project_root(cli: &Cli) -> std::io::Result<Utf8PathBuf> {
    let path = match &cli.project_root {
        Some(p) => p.clone(),
        None => std::env::current_dir()?,
    };
    Ok(Utf8PathBuf::from_path_buf(path).unwrap_or_else(|p| Utf8PathBuf::from(p.to_string_lossy().into_owned())))
}

fn print_failure(error: &XCheckerError) {
    eprintln!("error: {}", error.user_message());
    if let Some(context) = error.context() {
        eprintln!("  {context}");
    }
    for suggestion in error.suggestions() {
        eprintln!("  hint: {suggestion}");
    }
    tracing::error!(category = %error.category(), exit_code = error.to_exit_code().as_i32(), "{}", error.user_message());
}

/// Parse arguments, run the requested command to completion, and render any
/// failure. Returns `Err(ExitCode)` rather than exiting directly so `main`
/// stays a two-line process-exit mapping.
pub fn run() -> Result<(), ExitCode> {
    logging::init(LogFormat::Pretty);

    let cli = Cli::parse();
    let project_root = resolve_project_root(&cli).map_err(|e| {
        eprintln!("error: could not resolve project root: {e}");
        ExitCode::Other
    })?;

    let runtime = tokio::runtime::Runtime::new().map_err(|e| {
        eprintln!("error: could not start async runtime: {e}");
        ExitCode::Other
    })?;

    match runtime.block_on(sdp_cli::execute(cli, project_root)) {
        Ok(()) => Ok(()),
        Err(cli_err) => {
            let error = XCheckerError::Cli(cli_err);
            let exit_code = error.to_exit_code();
            print_failure(&error);
            Err(exit_code)
        }
    }
}
