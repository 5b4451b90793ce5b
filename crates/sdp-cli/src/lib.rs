//! Command-line interface for the xchecker orchestration core: argument
//! parsing, per-command execution, and the error union `commands/*` raise
//! through into the binary crate's exit-code mapping.

pub mod args;
pub mod commands;
pub mod error;
pub mod tracker;

pub use args::{BoundaryCommands, Cli, Commands, ContractCommands};
pub use error::CliError;

use camino::Utf8PathBuf;

/// Dispatch a parsed [`Cli`] invocation to its command implementation.
pub async fn execute(cli: Cli, project_root: Utf8PathBuf) -> Result<(), CliError> {
    match &cli.command {
        Commands::Init { feature_id, branch } => commands::init::execute(&cli, &project_root, feature_id, branch.clone()).await,
        Commands::Advance { feature_id } => commands::advance::execute(&cli, &project_root, feature_id).await,
        Commands::Apply { feature_id, json } => commands::apply::execute(&cli, &project_root, feature_id, *json).await,
        Commands::Status { feature_id, json } => commands::status::execute(&cli, &project_root, feature_id, *json).await,
        Commands::Boundary(BoundaryCommands::Detect { scopes, candidate_roots, json }) => {
            commands::boundary::execute(scopes, candidate_roots, *json).await
        }
        Commands::Contract(ContractCommands::Generate { scopes, candidate_roots, output_dir }) => {
            commands::contract::execute_generate(scopes, candidate_roots, output_dir).await
        }
        Commands::Contract(ContractCommands::Validate { contracts_dir, impl_dirs, json }) => {
            commands::contract::execute_validate(contracts_dir, impl_dirs, *json).await
        }
    }
}
