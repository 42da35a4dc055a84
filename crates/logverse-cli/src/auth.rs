//! Session persistence in the OS keychain, mirrored into the local database.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use logverse_core::auth::{AuthError, AuthResult, AuthSession, SessionPersistence};
use logverse_core::local::LocalSessionRecord;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "logverse-cli";
const DEFAULT_ACCOUNT: &str = "supabase_session";

/// Keychain slot holding the serialized [`AuthSession`].
#[derive(Clone)]
pub struct KeyringSessionStore {
    account: String,
}

impl KeyringSessionStore {
    pub fn new() -> Self {
        Self::for_account(DEFAULT_ACCOUNT)
    }

    pub fn for_account(account: &str) -> Self {
        Self {
            account: account.to_string(),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> AuthResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.account)
            .map_err(|error| AuthError::SessionStorage(error.to_string()))
    }
}

impl Default for KeyringSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionPersistence for KeyringSessionStore {
    #[cfg(not(test))]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        match self.entry()?.get_password() {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(AuthError::SessionStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SessionStorage(error.to_string()))?;
        guard
            .get(&self.account)
            .map(|raw| serde_json::from_str(raw))
            .transpose()
            .map_err(AuthError::from)
    }

    #[cfg(not(test))]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        self.entry()?
            .set_password(&raw)
            .map_err(|error| AuthError::SessionStorage(error.to_string()))
    }

    #[cfg(test)]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SessionStorage(error.to_string()))?;
        guard.insert(self.account.clone(), raw);
        Ok(())
    }

    #[cfg(not(test))]
    fn clear_session(&self) -> AuthResult<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(AuthError::SessionStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn clear_session(&self) -> AuthResult<()> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SessionStorage(error.to_string()))?;
        guard.remove(&self.account);
        Ok(())
    }
}

/// Keychain slot backed by the session record in the local database.
///
/// Every save and clear goes to both. Loads prefer the keychain and fall
/// back to the record when the keychain is empty or unavailable, so a
/// headless machine still finds the session.
#[derive(Clone)]
pub struct MirroredSessionStore {
    keyring: KeyringSessionStore,
    record: LocalSessionRecord,
}

impl MirroredSessionStore {
    pub const fn new(keyring: KeyringSessionStore, record: LocalSessionRecord) -> Self {
        Self { keyring, record }
    }
}

impl SessionPersistence for MirroredSessionStore {
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        match self.keyring.load_session() {
            Ok(Some(session)) => Ok(Some(session)),
            Ok(None) => self.record.load_session(),
            Err(error) => {
                tracing::warn!("Keychain unavailable, using local session record: {}", error);
                self.record.load_session()
            }
        }
    }

    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        self.record.save_session(session)?;
        if let Err(error) = self.keyring.save_session(session) {
            tracing::warn!("Session kept in local record only: {}", error);
        }
        Ok(())
    }

    fn clear_session(&self) -> AuthResult<()> {
        let keyring_result = self.keyring.clear_session();
        self.record.clear_session()?;
        keyring_result
    }
}
