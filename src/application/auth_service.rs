// Auth service - Sessions behind the identity provider
use crate::application::errors::TrackerError;
use crate::application::identity_provider::IdentityProvider;
use crate::application::incident_repository::IncidentRepository;
use crate::application::notices::NoticeBoard;
use crate::domain::incident::ValidationError;
use crate::domain::session::{AuthFailure, Session};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Sessions unused for this long are dropped.
const DEFAULT_IDLE_TIMEOUT_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone)]
struct SessionEntry {
    session: Session,
    last_seen: DateTime<Utc>,
}

/// What the client gets back after signing in
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub token: String,
    pub uid: String,
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    repository: Arc<dyn IncidentRepository>,
    notices: Arc<NoticeBoard>,
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
    idle_timeout: Duration,
}

impl AuthService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        repository: Arc<dyn IncidentRepository>,
        notices: Arc<NoticeBoard>,
    ) -> Self {
        Self {
            identity,
            repository,
            notices,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout: Duration::seconds(DEFAULT_IDLE_TIMEOUT_SECS),
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, TrackerError> {
        let (email, password) = credentials(email, password)?;
        let session = self.identity.sign_in(email, password).await?;
        Ok(self.open_session(session).await)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignedIn, TrackerError> {
        let (email, password) = credentials(email, password)?;
        let session = self.identity.sign_up(email, password).await?;
        Ok(self.open_session(session).await)
    }

    pub async fn sign_in_with_oauth(
        &self,
        provider_id: &str,
        id_token: &str,
    ) -> Result<SignedIn, TrackerError> {
        let session = self
            .identity
            .sign_in_with_idp(provider_id.trim(), id_token.trim())
            .await?;
        Ok(self.open_session(session).await)
    }

    /// Returns whether the token belonged to a live session
    pub async fn sign_out(&self, token: &str) -> bool {
        let removed = self.sessions.write().await.remove(token);
        if let Some(entry) = &removed {
            tracing::info!("Signed out {}", entry.session.uid);
        }
        removed.is_some()
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), TrackerError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthFailure::InvalidEmail.into());
        }
        self.identity.send_password_reset(email).await
    }

    pub async fn confirm_password_reset(
        &self,
        code: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), TrackerError> {
        if code.trim().is_empty() {
            return Err(AuthFailure::InvalidResetCode.into());
        }
        if new_password != confirm_password {
            return Err(ValidationError::PasswordMismatch.into());
        }
        self.identity
            .confirm_password_reset(code.trim(), new_password)
            .await
    }

    /// Session behind a bearer token, refreshing provider tokens when they
    /// are about to expire. A failed refresh or an idle timeout ends the
    /// session.
    pub async fn resolve(&self, token: &str) -> Result<Session, TrackerError> {
        let now = Utc::now();
        let session = {
            let mut sessions = self.sessions.write().await;
            let Some(entry) = sessions.get_mut(token) else {
                return Err(TrackerError::Unauthorized);
            };
            if now - entry.last_seen > self.idle_timeout {
                let uid = entry.session.uid.clone();
                sessions.remove(token);
                tracing::info!("Session of {} expired after inactivity", uid);
                return Err(TrackerError::Unauthorized);
            }
            entry.last_seen = now;
            entry.session.clone()
        };

        if !session.needs_refresh(now) {
            return Ok(session);
        }

        match self.identity.refresh(&session).await {
            Ok(refreshed) => {
                tracing::debug!("Refreshed provider token of {}", refreshed.uid);
                self.sessions.write().await.insert(
                    token.to_string(),
                    SessionEntry {
                        session: refreshed.clone(),
                        last_seen: now,
                    },
                );
                Ok(refreshed)
            }
            Err(e) => {
                tracing::warn!("Token refresh failed for {}: {}", session.uid, e);
                self.sessions.write().await.remove(token);
                Err(e)
            }
        }
    }

    async fn open_session(&self, session: Session) -> SignedIn {
        // The session stays usable even if the user documents could not be prepared
        if let Err(e) = self.repository.initialize_user(&session).await {
            let _ = self
                .notices
                .report(&session.uid, "Failed to initialize user data", e)
                .await;
        }

        let token = Uuid::new_v4().simple().to_string();
        let signed_in = SignedIn {
            token: token.clone(),
            uid: session.uid.clone(),
            email: session.email.clone(),
        };

        tracing::info!("Signed in {}", session.uid);
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| now - entry.last_seen <= self.idle_timeout);
        if sessions.len() < before {
            tracing::debug!("Dropped {} idle session(s)", before - sessions.len());
        }
        sessions.insert(
            token,
            SessionEntry {
                session,
                last_seen: now,
            },
        );
        signed_in
    }
}

fn credentials<'a>(email: &'a str, password: &'a str) -> Result<(&'a str, &'a str), TrackerError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials.into());
    }
    Ok((email, password))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::live_feed::LiveFeed;
    use crate::application::testing::{MemoryRepository, StubIdentity, STUB_PASSWORD};
    use std::sync::atomic::Ordering;

    struct Fixture {
        identity: Arc<StubIdentity>,
        repository: Arc<MemoryRepository>,
        auth: AuthService,
    }

    fn fixture() -> Fixture {
        let identity = Arc::new(StubIdentity::default());
        let repository = Arc::new(MemoryRepository::default());
        let notices = Arc::new(NoticeBoard::new(
            std::time::Duration::from_secs(5),
            Arc::new(LiveFeed::new()),
        ));
        let auth = AuthService::new(identity.clone(), repository.clone(), notices);
        Fixture {
            identity,
            repository,
            auth,
        }
    }

    #[tokio::test]
    async fn test_sign_in_initializes_user_and_issues_token() {
        let f = fixture();
        let signed_in = f
            .auth
            .sign_in("alice@example.com", STUB_PASSWORD)
            .await
            .unwrap();

        assert_eq!(signed_in.uid, "alice");
        assert!(f.repository.is_initialized("alice"));
        assert_eq!(f.repository.counter("alice"), Some(0));

        let session = f.auth.resolve(&signed_in.token).await.unwrap();
        assert_eq!(session.uid, "alice");
    }

    #[tokio::test]
    async fn test_wrong_password_is_mapped() {
        let f = fixture();
        let result = f.auth.sign_in("alice@example.com", "nope").await;
        assert!(matches!(
            result,
            Err(TrackerError::Auth(AuthFailure::InvalidCredentials))
        ));
    }

    #[tokio::test]
    async fn test_missing_credentials_rejected_locally() {
        let f = fixture();
        let result = f.auth.sign_up("  ", STUB_PASSWORD).await;
        assert!(matches!(
            result,
            Err(TrackerError::Validation(ValidationError::MissingCredentials))
        ));
    }

    #[tokio::test]
    async fn test_sign_out_invalidates_token() {
        let f = fixture();
        let signed_in = f.auth.sign_in("alice@example.com", STUB_PASSWORD).await.unwrap();

        assert!(f.auth.sign_out(&signed_in.token).await);
        assert!(!f.auth.sign_out(&signed_in.token).await);
        assert!(matches!(
            f.auth.resolve(&signed_in.token).await,
            Err(TrackerError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_expiring_session_is_refreshed() {
        let f = fixture();
        let signed_in = f.auth.sign_in("alice@example.com", STUB_PASSWORD).await.unwrap();
        f.auth
            .sessions
            .write()
            .await
            .get_mut(&signed_in.token)
            .unwrap()
            .session
            .expires_at = Utc::now();

        let session = f.auth.resolve(&signed_in.token).await.unwrap();

        assert!(session.id_token.ends_with("-refreshed"));
        assert_eq!(f.identity.refreshes.load(Ordering::SeqCst), 1);
        f.auth.resolve(&signed_in.token).await.unwrap();
        assert_eq!(f.identity.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_idle_session_is_rejected() {
        let f = fixture();
        let signed_in = f.auth.sign_in("alice@example.com", STUB_PASSWORD).await.unwrap();
        f.auth
            .sessions
            .write()
            .await
            .get_mut(&signed_in.token)
            .unwrap()
            .last_seen = Utc::now() - Duration::days(8);

        assert!(matches!(
            f.auth.resolve(&signed_in.token).await,
            Err(TrackerError::Unauthorized)
        ));
        assert!(f.auth.sessions.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_drops_abandoned_sessions() {
        let f = fixture();
        let auth = f.auth.with_idle_timeout(Duration::minutes(30));
        let stale = auth.sign_in("alice@example.com", STUB_PASSWORD).await.unwrap();
        auth.sessions
            .write()
            .await
            .get_mut(&stale.token)
            .unwrap()
            .last_seen = Utc::now() - Duration::hours(1);

        let fresh = auth.sign_in("bob@example.com", STUB_PASSWORD).await.unwrap();

        let sessions = auth.sessions.read().await;
        assert_eq!(sessions.len(), 1);
        assert!(sessions.contains_key(&fresh.token));
    }

    #[tokio::test]
    async fn test_sign_in_survives_failed_initialization() {
        let f = fixture();
        f.repository.fail_requests(true);

        let signed_in = f.auth.sign_in("alice@example.com", STUB_PASSWORD).await.unwrap();
        assert!(f.auth.resolve(&signed_in.token).await.is_ok());
        assert!(!f.repository.is_initialized("alice"));
    }

    #[tokio::test]
    async fn test_oauth_sign_in() {
        let f = fixture();
        let signed_in = f
            .auth
            .sign_in_with_oauth("google.com", "google-id-token")
            .await
            .unwrap();
        assert_eq!(signed_in.uid, "oauth-user");

        let rejected = f.auth.sign_in_with_oauth("google.com", "").await;
        assert!(matches!(
            rejected,
            Err(TrackerError::Auth(AuthFailure::ProviderRejected))
        ));
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let f = fixture();
        f.auth
            .request_password_reset("alice@example.com")
            .await
            .unwrap();
        assert_eq!(
            f.identity.reset_requests.lock().unwrap().as_slice(),
            ["alice@example.com".to_string()]
        );

        let mismatch = f
            .auth
            .confirm_password_reset("valid-code", "new-secret", "other")
            .await;
        assert!(matches!(
            mismatch,
            Err(TrackerError::Validation(ValidationError::PasswordMismatch))
        ));

        let expired = f
            .auth
            .confirm_password_reset("stale", "new-secret", "new-secret")
            .await;
        assert!(matches!(
            expired,
            Err(TrackerError::Auth(AuthFailure::InvalidResetCode))
        ));

        f.auth
            .confirm_password_reset("valid-code", "new-secret", "new-secret")
            .await
            .unwrap();
    }
}
