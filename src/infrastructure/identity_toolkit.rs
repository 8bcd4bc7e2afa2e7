// Firebase Identity Toolkit REST implementation of the identity provider
use crate::application::errors::TrackerError;
use crate::application::identity_provider::IdentityProvider;
use crate::domain::session::{AuthFailure, Session};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

const ACCOUNTS_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts";
const TOKEN_URL: &str = "https://securetoken.googleapis.com/v1/token";
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

#[derive(Debug, Clone)]
pub struct IdentityToolkit {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: String,
    refresh_token: String,
    user_id: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

impl AccountResponse {
    fn into_session(self) -> Session {
        Session::new(
            self.local_id,
            self.email.filter(|e| !e.is_empty()),
            self.id_token,
            self.refresh_token,
            expires_in_secs(self.expires_in.as_deref()),
        )
    }
}

impl IdentityToolkit {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
    ) -> Result<T, TrackerError> {
        let response = request
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                TrackerError::upstream(
                    "Authentication service is unavailable",
                    anyhow!(e).context(format!("{operation} request failed")),
                )
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            TrackerError::upstream(
                "Authentication service is unavailable",
                anyhow!(e).context(format!("Failed to read {operation} response")),
            )
        })?;

        if !status.is_success() {
            return Err(rejection(status, &body, operation));
        }

        serde_json::from_str(&body)
            .with_context(|| format!("Unexpected {operation} response"))
            .map_err(|e| TrackerError::upstream("Authentication failed. Please try again.", e))
    }

    async fn accounts<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &impl Serialize,
    ) -> Result<T, TrackerError> {
        let request = self
            .client
            .post(format!("{ACCOUNTS_URL}:{method}"))
            .json(body);
        self.call(request, method).await
    }

    async fn password_account(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, TrackerError> {
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let account: AccountResponse = self.accounts(method, &body).await?;
        Ok(account.into_session())
    }
}

#[async_trait]
impl IdentityProvider for IdentityToolkit {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, TrackerError> {
        self.password_account("signInWithPassword", email, password)
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, TrackerError> {
        self.password_account("signUp", email, password).await
    }

    async fn sign_in_with_idp(
        &self,
        provider_id: &str,
        id_token: &str,
    ) -> Result<Session, TrackerError> {
        if provider_id.is_empty() || id_token.is_empty() {
            return Err(AuthFailure::ProviderRejected.into());
        }

        let body = json!({
            "postBody": idp_post_body(provider_id, id_token),
            "requestUri": "http://localhost",
            "returnSecureToken": true,
            "returnIdpCredential": true,
        });
        let account: AccountResponse = self.accounts("signInWithIdp", &body).await?;
        Ok(account.into_session())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), TrackerError> {
        let body = json!({ "requestType": "PASSWORD_RESET", "email": email });
        let _: serde_json::Value = self.accounts("sendOobCode", &body).await?;
        tracing::info!("Password reset email requested");
        Ok(())
    }

    async fn confirm_password_reset(
        &self,
        code: &str,
        new_password: &str,
    ) -> Result<(), TrackerError> {
        let body = json!({ "oobCode": code, "newPassword": new_password });
        let _: serde_json::Value = self.accounts("resetPassword", &body).await?;
        Ok(())
    }

    async fn refresh(&self, session: &Session) -> Result<Session, TrackerError> {
        let request = self.client.post(TOKEN_URL).form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", session.refresh_token.as_str()),
        ]);
        let token: TokenResponse = self.call(request, "token").await?;

        Ok(Session::new(
            token.user_id,
            session.email.clone(),
            token.id_token,
            token.refresh_token,
            expires_in_secs(token.expires_in.as_deref()),
        ))
    }
}

fn expires_in_secs(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_EXPIRES_IN_SECS)
}

fn idp_post_body(provider_id: &str, id_token: &str) -> String {
    format!(
        "id_token={}&providerId={}",
        urlencoding::encode(id_token),
        urlencoding::encode(provider_id)
    )
}

/// Provider error codes become `Auth`; anything unreadable is an upstream failure
fn rejection(status: reqwest::StatusCode, body: &str, operation: &str) -> TrackerError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let failure = AuthFailure::from_provider_code(&envelope.error.message);
            if let AuthFailure::Unknown(code) = &failure {
                tracing::warn!("Unmapped {} error code {}", operation, code);
            }
            failure.into()
        }
        Err(_) => TrackerError::upstream(
            "Authentication service is unavailable",
            anyhow!("{} failed with status {}: {}", operation, status, body),
        ),
    }
}
