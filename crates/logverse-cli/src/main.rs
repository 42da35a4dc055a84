//! LogVerse CLI - log your days hour by hour from the terminal
//!
//! Uses the hosted backend when `LOGVERSE_SUPABASE_URL` and
//! `LOGVERSE_SUPABASE_ANON_KEY` are set, the local store only otherwise.

mod auth;
mod cli;
mod commands;
mod context;
mod error;


use std::sync::Arc;

use clap::Parser;
use logverse_core::config::{ConfigError, RemoteConfig};
use logverse_core::local::{LocalSessionRecord, LocalStore};
use logverse_core::remote::{NoRemote, SupabaseRemote};
use logverse_core::session::{LocalOnlyAuthenticator, SessionStore, SupabaseAuthenticator};
use tracing_subscriber::EnvFilter;

use crate::auth::{KeyringSessionStore, MirroredSessionStore};
use crate::cli::{Cli, Commands};
use crate::commands::common::resolve_db_path;
use crate::commands::completions::run_completions;
use crate::commands::dispatch;
use crate::context::AppContext;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("logverse=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let db_path = resolve_db_path(cli.db_path);
    let local = Arc::new(LocalStore::open(&db_path)?);
    let persistence = MirroredSessionStore::new(
        KeyringSessionStore::new(),
        LocalSessionRecord::new(Arc::clone(&local)),
    );

    match RemoteConfig::from_env() {
        Ok(Some(config)) => {
            let sessions = SessionStore::new(SupabaseAuthenticator::new(&config, persistence)?);
            let remote = SupabaseRemote::new(&config, sessions.handle())?;
            let context = AppContext::new(sessions, remote, local, None);
            dispatch(cli.command, &context).await
        }
        Ok(None) => run_local_only(cli.command, local, persistence, None).await,
        Err(error) => {
            tracing::warn!("Remote backend disabled: {}", error);
            run_local_only(cli.command, local, persistence, Some(error)).await
        }
    }
}

async fn run_local_only(
    command: Commands,
    local: Arc<LocalStore>,
    persistence: MirroredSessionStore,
    config_error: Option<ConfigError>,
) -> Result<(), CliError> {
    let sessions = SessionStore::new(LocalOnlyAuthenticator::new(persistence));
    let context = AppContext::new(sessions, NoRemote, local, config_error);
    dispatch(command, &context).await
}
