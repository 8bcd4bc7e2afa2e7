// Authenticated session domain model
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Refresh provider tokens this long before they actually expire.
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub uid: String,
    pub email: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        uid: String,
        email: Option<String>,
        id_token: String,
        refresh_token: String,
        expires_in_secs: i64,
    ) -> Self {
        Self {
            uid,
            email,
            id_token,
            refresh_token,
            expires_at: Utc::now() + Duration::seconds(expires_in_secs),
        }
    }

    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) >= self.expires_at
    }
}

/// Identity provider rejections, keyed by the provider's error code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("An account with this email already exists.")]
    EmailInUse,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Password should be at least 6 characters.")]
    WeakPassword,
    #[error("Please enter your password.")]
    MissingPassword,
    #[error("Too many attempts. Please try again later.")]
    TooManyAttempts,
    #[error("This account has been disabled.")]
    UserDisabled,
    #[error("This password reset link is invalid or has expired. Please request a new one.")]
    InvalidResetCode,
    #[error("Sign-in with this provider failed. Please try again.")]
    ProviderRejected,
    #[error("Your session has expired. Please sign in again.")]
    SessionExpired,
    #[error("Authentication failed. Please try again.")]
    Unknown(String),
}

impl AuthFailure {
    /// Map a provider code such as `"WEAK_PASSWORD : Password should be ..."`.
    pub fn from_provider_code(raw: &str) -> Self {
        let code = raw.split(':').next().unwrap_or(raw).trim();
        match code {
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
                Self::InvalidCredentials
            }
            "EMAIL_EXISTS" => Self::EmailInUse,
            "INVALID_EMAIL" | "MISSING_EMAIL" => Self::InvalidEmail,
            "WEAK_PASSWORD" => Self::WeakPassword,
            "MISSING_PASSWORD" => Self::MissingPassword,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyAttempts,
            "USER_DISABLED" => Self::UserDisabled,
            "EXPIRED_OOB_CODE" | "INVALID_OOB_CODE" => Self::InvalidResetCode,
            "INVALID_IDP_RESPONSE" => Self::ProviderRejected,
            "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" => Self::SessionExpired,
            other => Self::Unknown(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_provider_code() {
        assert_eq!(
            AuthFailure::from_provider_code("EMAIL_NOT_FOUND"),
            AuthFailure::InvalidCredentials
        );
        assert_eq!(
            AuthFailure::from_provider_code(
                "WEAK_PASSWORD : Password should be at least 6 characters"
            ),
            AuthFailure::WeakPassword
        );
        assert_eq!(
            AuthFailure::from_provider_code("EXPIRED_OOB_CODE"),
            AuthFailure::InvalidResetCode
        );
    }

    #[test]
    fn test_unmapped_code_falls_back_to_generic_message() {
        let failure = AuthFailure::from_provider_code("OPERATION_NOT_ALLOWED");
        assert_eq!(failure, AuthFailure::Unknown("OPERATION_NOT_ALLOWED".to_string()));
        assert_eq!(failure.to_string(), "Authentication failed. Please try again.");
    }

    #[test]
    fn test_needs_refresh() {
        let session = Session::new(
            "uid".to_string(),
            None,
            "id".to_string(),
            "refresh".to_string(),
            3600,
        );
        assert!(!session.needs_refresh(Utc::now()));
        assert!(session.needs_refresh(Utc::now() + Duration::seconds(3550)));
    }
}
