//! Session persistence in the local store.

use std::sync::Arc;

use super::LocalStore;
use crate::auth::{AuthError, AuthResult, AuthSession, SessionPersistence};

const SESSION_KEY: &str = "auth_session";

/// Keeps the signed-in session in the store's global namespace.
#[derive(Clone)]
pub struct LocalSessionRecord {
    store: Arc<LocalStore>,
}

impl LocalSessionRecord {
    pub const fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }
}

impl SessionPersistence for LocalSessionRecord {
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        Ok(self.store.read_global(SESSION_KEY))
    }

    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        self.store
            .write_global(SESSION_KEY, session)
            .map_err(|error| AuthError::SessionStorage(error.to_string()))
    }

    fn clear_session(&self) -> AuthResult<()> {
        self.store
            .remove_global(SESSION_KEY)
            .map_err(|error| AuthError::SessionStorage(error.to_string()))
    }
}
