use std::io;

use logverse_core::auth::AuthError;
use logverse_core::config::ConfigError;
use logverse_core::remote::RemoteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] logverse_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Remote setup failed: {0}")]
    Remote(#[from] RemoteError),
    #[error("Not signed in. Run `logverse auth login` first.")]
    NotSignedIn,
    #[error("Activity not found: {0}")]
    ActivityNotFound(String),
    #[error("No cell logged at {0}")]
    CellNotFound(String),
}
