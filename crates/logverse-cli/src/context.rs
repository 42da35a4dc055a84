//! Services shared by every command, built once per invocation.

use std::sync::Arc;

use logverse_core::auth::AuthError;
use logverse_core::config::ConfigError;
use logverse_core::local::LocalStore;
use logverse_core::remote::RemoteStore;
use logverse_core::session::{Authenticator, SessionStore};
use logverse_core::{ActivityLog, StorageFacade};

use crate::error::CliError;

pub struct AppContext<A: Authenticator, R: RemoteStore> {
    pub sessions: SessionStore<A>,
    pub storage: Arc<StorageFacade<R>>,
    /// Why the remote backend was not used, when it was configured badly.
    config_error: Option<ConfigError>,
}

impl<A: Authenticator, R: RemoteStore> AppContext<A, R> {
    pub fn new(
        sessions: SessionStore<A>,
        remote: R,
        local: Arc<LocalStore>,
        config_error: Option<ConfigError>,
    ) -> Self {
        let storage = Arc::new(StorageFacade::new(local, remote, sessions.handle()));
        Self {
            sessions,
            storage,
            config_error,
        }
    }

    /// Resolve the signed-in user and load their log.
    pub async fn open_log(&self) -> Result<ActivityLog<R>, CliError> {
        let user = self
            .sessions
            .current_user()
            .await?
            .ok_or(CliError::NotSignedIn)?;
        tracing::debug!("Opening activity log for {}", user.id);
        Ok(ActivityLog::load(Arc::clone(&self.storage)).await)
    }

    /// Report a bad remote configuration instead of a bare "not configured".
    pub fn auth_error(&self, error: AuthError) -> CliError {
        match (&error, &self.config_error) {
            (AuthError::NotConfigured, Some(config_error)) => {
                CliError::Config(config_error.clone())
            }
            _ => CliError::Auth(error),
        }
    }
}
