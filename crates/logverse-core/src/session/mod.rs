//! Session store: current identity, sign-in/up/out, change notifications.
//!
//! The backend is chosen once at startup: [`SupabaseAuthenticator`] when a
//! remote is configured, [`LocalOnlyAuthenticator`] otherwise. Local-only
//! mode never creates identities; it only honours a session record left by
//! an earlier remote sign-in.

mod events;

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use crate::auth::{
    AuthError, AuthResult, AuthSession, AuthUser, SessionPersistence, SignUpOutcome,
    SupabaseAuthClient,
};
use crate::config::RemoteConfig;

pub use events::{SessionEvent, SessionEventKind, Subscription};
use events::SessionEvents;

/// Authentication backend strategy.
pub trait Authenticator: Send + Sync + 'static {
    /// Whether sessions come from a configured remote backend.
    fn is_remote(&self) -> bool;

    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = AuthResult<SignUpOutcome>> + Send;

    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = AuthResult<AuthSession>> + Send;

    /// Clear the persisted session and revoke it where possible.
    fn sign_out(&self, session: Option<&AuthSession>) -> impl Future<Output = AuthResult<()>> + Send;

    /// Session persisted by an earlier run, refreshed if the backend can.
    fn restore(&self) -> impl Future<Output = AuthResult<Option<AuthSession>>> + Send;
}

/// Remote-backed authentication through Supabase auth.
pub struct SupabaseAuthenticator<P: SessionPersistence> {
    client: SupabaseAuthClient<P>,
}

impl<P: SessionPersistence> SupabaseAuthenticator<P> {
    pub fn new(config: &RemoteConfig, persistence: P) -> AuthResult<Self> {
        Ok(Self {
            client: SupabaseAuthClient::new(config, persistence)?,
        })
    }
}

impl<P: SessionPersistence> Authenticator for SupabaseAuthenticator<P> {
    fn is_remote(&self) -> bool {
        true
    }

    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        self.client.sign_up(email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        self.client.sign_in(email, password).await
    }

    async fn sign_out(&self, session: Option<&AuthSession>) -> AuthResult<()> {
        let session = match session {
            Some(session) => Some(session.clone()),
            None => self.client.stored_session()?,
        };
        match session {
            Some(session) => self.client.sign_out(&session.access_token).await,
            None => Ok(()),
        }
    }

    async fn restore(&self) -> AuthResult<Option<AuthSession>> {
        self.client.restore_session().await
    }
}

/// Authentication when no remote backend is configured: every sign-in and
/// sign-up is refused with [`AuthError::NotConfigured`].
pub struct LocalOnlyAuthenticator<P: SessionPersistence> {
    persistence: P,
}

impl<P: SessionPersistence> LocalOnlyAuthenticator<P> {
    pub const fn new(persistence: P) -> Self {
        Self { persistence }
    }
}

impl<P: SessionPersistence> Authenticator for LocalOnlyAuthenticator<P> {
    fn is_remote(&self) -> bool {
        false
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> AuthResult<SignUpOutcome> {
        Err(AuthError::NotConfigured)
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> AuthResult<AuthSession> {
        Err(AuthError::NotConfigured)
    }

    async fn sign_out(&self, _session: Option<&AuthSession>) -> AuthResult<()> {
        self.persistence.clear_session()
    }

    async fn restore(&self) -> AuthResult<Option<AuthSession>> {
        self.persistence.load_session()
    }
}

/// Shared view of the active session, readable by the persistence layers.
#[derive(Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<AuthSession>>>,
}

impl SessionHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle pre-populated with a session, e.g. in tests or embedders that
    /// manage auth themselves.
    #[must_use]
    pub fn with_session(session: AuthSession) -> Self {
        let handle = Self::new();
        handle.set(Some(session));
        handle
    }

    #[must_use]
    pub fn current(&self) -> Option<AuthSession> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<AuthUser> {
        self.current().map(|session| session.user)
    }

    #[must_use]
    pub fn user_id(&self) -> Option<String> {
        self.current().map(|session| session.user.id)
    }

    pub(crate) fn set(&self, session: Option<AuthSession>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = session;
    }
}

/// Session service with an explicit lifecycle: construct at startup, share
/// its [`SessionHandle`] with the storage layer, drop at shutdown.
pub struct SessionStore<A: Authenticator> {
    authenticator: A,
    handle: SessionHandle,
    events: SessionEvents,
}

impl<A: Authenticator> SessionStore<A> {
    pub fn new(authenticator: A) -> Self {
        if authenticator.is_remote() {
            tracing::info!("Session store using remote authentication");
        } else {
            tracing::info!("Session store running in local-only mode (sign-in disabled)");
        }
        Self {
            authenticator,
            handle: SessionHandle::new(),
            events: SessionEvents::new(),
        }
    }

    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn is_remote(&self) -> bool {
        self.authenticator.is_remote()
    }

    /// Resolve the signed-in user, restoring (and refreshing) a persisted
    /// session when nothing is cached yet or the cached one has expired.
    pub async fn current_user(&self) -> AuthResult<Option<AuthUser>> {
        if let Some(session) = self.handle.current() {
            if !session.is_expired() || !self.is_remote() {
                return Ok(Some(session.user));
            }
        }

        let previous = self.handle.current();
        let restored = self.authenticator.restore().await?;
        self.handle.set(restored.clone());

        match (&previous, &restored) {
            (Some(previous), Some(restored))
                if previous.access_token != restored.access_token =>
            {
                self.events
                    .emit(SessionEventKind::TokenRefreshed, Some(restored.user.clone()));
            }
            (Some(_), None) => self.events.emit(SessionEventKind::SignedOut, None),
            _ => {}
        }

        Ok(restored.map(|session| session.user))
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        match self.authenticator.sign_up(email, password).await? {
            SignUpOutcome::SignedIn(session) => Ok(self.activate(session)),
            SignUpOutcome::ConfirmationRequired => Err(AuthError::ConfirmationRequired),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        let session = self.authenticator.sign_in(email, password).await?;
        Ok(self.activate(session))
    }

    /// Forget the session locally and remotely.
    pub async fn sign_out(&self) -> AuthResult<()> {
        let session = self.handle.current();
        self.handle.set(None);
        let result = self.authenticator.sign_out(session.as_ref()).await;
        self.events.emit(SessionEventKind::SignedOut, None);
        match &result {
            Ok(()) => tracing::info!("Signed out"),
            Err(error) => tracing::warn!("Signed out with errors: {}", error),
        }
        result
    }

    /// Subscribe to sign-in, token refresh and sign-out transitions.
    ///
    /// The callback runs on a Tokio task; keep the returned [`Subscription`]
    /// alive for as long as events should be delivered.
    pub fn on_session_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&SessionEvent) + Send + 'static,
    {
        self.events.subscribe(callback)
    }

    fn activate(&self, session: AuthSession) -> AuthUser {
        let user = session.user.clone();
        self.handle.set(Some(session));
        tracing::info!("Signed in as {}", user.id);
        self.events
            .emit(SessionEventKind::SignedIn, Some(user.clone()));
        user
    }
}
