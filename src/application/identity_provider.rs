// Identity provider trait for the authentication gate
use crate::application::errors::TrackerError;
use crate::domain::session::Session;
use async_trait::async_trait;

/// Provider rejections come back as `TrackerError::Auth`, transport failures
/// as `TrackerError::Upstream`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, TrackerError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, TrackerError>;

    /// Exchange an OAuth id token from `provider_id` (e.g. "google.com")
    async fn sign_in_with_idp(
        &self,
        provider_id: &str,
        id_token: &str,
    ) -> Result<Session, TrackerError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), TrackerError>;

    async fn confirm_password_reset(
        &self,
        code: &str,
        new_password: &str,
    ) -> Result<(), TrackerError>;

    /// New tokens for a session whose id token is about to expire
    async fn refresh(&self, session: &Session) -> Result<Session, TrackerError>;
}
