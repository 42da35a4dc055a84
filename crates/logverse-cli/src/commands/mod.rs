pub mod activity;
pub mod auth_cmd;
pub mod cell;
pub mod common;
pub mod completions;
pub mod export;
pub mod grid;
pub mod theme;

use logverse_core::remote::RemoteStore;
use logverse_core::session::Authenticator;

use crate::cli::Commands;
use crate::context::AppContext;
use crate::error::CliError;

pub async fn dispatch<A: Authenticator, R: RemoteStore>(
    command: Commands,
    context: &AppContext<A, R>,
) -> Result<(), CliError> {
    match command {
        Commands::Auth { command } => auth_cmd::run_auth(command, context).await,
        Commands::Activity { command } => activity::run_activity(command, context).await,
        Commands::Cell { command } => cell::run_cell(command, context).await,
        Commands::Grid { command } => grid::run_grid(command, context).await,
        Commands::Theme { command } => theme::run_theme(command, context).await,
        Commands::Export { format, output } => {
            export::run_export(format, output.as_deref(), context).await
        }
        Commands::Completions { shell, output } => {
            completions::run_completions(shell, output.as_deref())
        }
    }
}
