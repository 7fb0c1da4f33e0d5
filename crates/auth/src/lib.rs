//! Authentication client for the Outfit hosted backend
//!
//! Provides sign up, sign in, session management, password recovery and
//! password updates against the backend's auth API.

use chrono::Utc;
use log::debug;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use url::Url;

/// Error type
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Missing session")]
    MissingSession,
}

/// Account as known to the auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Signed-in session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub token_type: String,
    pub user: User,
}

impl Session {
    /// Whether the access token has passed its expiry timestamp
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now().timestamp() >= expires_at,
            None => false,
        }
    }
}

/// Outcome of a sign up request.
///
/// Projects that require email confirmation answer with the bare user and
/// no session.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    SignedIn(Session),
    ConfirmationRequired(User),
}

impl SignUpOutcome {
    pub fn user(&self) -> &User {
        match self {
            SignUpOutcome::SignedIn(session) => &session.user,
            SignUpOutcome::ConfirmationRequired(user) => user,
        }
    }
}

/// Extra data sent along with a sign up
#[derive(Debug, Clone, Default)]
pub struct SignUpOptions {
    /// Stored as the account's user metadata
    pub data: Option<Value>,
    /// Where the confirmation email should send the user
    pub email_redirect_to: Option<String>,
}

/// Client options
#[derive(Debug, Clone)]
pub struct AuthOptions {
    pub auto_refresh_token: bool,
    pub persist_session: bool,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            auto_refresh_token: true,
            persist_session: true,
        }
    }
}

/// Auth client. Clones share the same session.
#[derive(Debug, Clone)]
pub struct Auth {
    url: String,
    key: String,
    http_client: Client,
    options: AuthOptions,
    current_session: Arc<RwLock<Option<Session>>>,
}

impl Auth {
    /// Create an auth client
    pub fn new(url: &str, key: &str, http_client: Client, options: AuthOptions) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            http_client,
            options,
            current_session: Arc::new(RwLock::new(None)),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    fn read_session(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.current_session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.current_session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn store_session(&self, session: &Session) {
        if self.options.persist_session {
            *self.write_session() = Some(session.clone());
        }
    }

    /// Register a new account
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        options: SignUpOptions,
    ) -> Result<SignUpOutcome, AuthError> {
        let mut url = Url::parse(&self.endpoint("/signup"))?;
        if let Some(redirect_to) = &options.email_redirect_to {
            url.query_pairs_mut().append_pair("redirect_to", redirect_to);
        }
        debug!("POST {}", url);

        let mut payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        if let Some(data) = options.data {
            payload["data"] = data;
        }

        let response = self
            .http_client
            .post(url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let body: Value = check_status(response).await?.json().await?;

        if body.get("access_token").is_some() {
            let session: Session = serde_json::from_value(body)?;
            self.store_session(&session);
            Ok(SignUpOutcome::SignedIn(session))
        } else {
            let user_body = body.get("user").cloned().unwrap_or(body);
            let user: User = serde_json::from_value(user_body)?;
            Ok(SignUpOutcome::ConfirmationRequired(user))
        }
    }

    /// Sign in with email and password
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let url = self.endpoint("/token?grant_type=password");
        debug!("POST {}", url);

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let session: Session = check_status(response).await?.json().await?;
        self.store_session(&session);

        Ok(session)
    }

    /// Current session, if any
    pub fn get_session(&self) -> Option<Session> {
        self.read_session().clone()
    }

    /// Replace the current session, e.g. one restored from secure storage
    pub fn set_session(&self, session: Session) {
        *self.write_session() = Some(session);
    }

    /// Forget the current session locally
    pub fn clear_session(&self) {
        *self.write_session() = None;
    }

    /// Id of the signed-in user
    pub fn current_user_id(&self) -> Option<String> {
        self.read_session().as_ref().map(|s| s.user.id.clone())
    }

    /// Fetch the signed-in user
    pub async fn get_user(&self) -> Result<User, AuthError> {
        let session = self.get_session().ok_or(AuthError::MissingSession)?;

        let response = self
            .http_client
            .get(self.endpoint("/user"))
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await?;

        let user: User = check_status(response).await?.json().await?;
        Ok(user)
    }

    /// Exchange the refresh token for a new session
    pub async fn refresh_session(&self) -> Result<Session, AuthError> {
        let session = self.get_session().ok_or(AuthError::MissingSession)?;

        let payload = serde_json::json!({
            "refresh_token": session.refresh_token,
        });

        let response = self
            .http_client
            .post(self.endpoint("/token?grant_type=refresh_token"))
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let new_session: Session = check_status(response).await?.json().await?;
        self.store_session(&new_session);

        Ok(new_session)
    }

    /// Refresh the session when it has expired and auto refresh is enabled
    pub async fn ensure_fresh_session(&self) -> Result<Option<Session>, AuthError> {
        match self.get_session() {
            Some(session) if session.is_expired() && self.options.auto_refresh_token => {
                self.refresh_session().await.map(Some)
            }
            other => Ok(other),
        }
    }

    /// Sign out and drop the session
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let session = self.get_session().ok_or(AuthError::MissingSession)?;

        let response = self
            .http_client
            .post(self.endpoint("/logout"))
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await?;

        check_status(response).await?;
        self.clear_session();

        Ok(())
    }

    /// Send a password recovery email
    pub async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), AuthError> {
        let mut url = Url::parse(&self.endpoint("/recover"))?;
        if let Some(redirect_to) = redirect_to {
            url.query_pairs_mut().append_pair("redirect_to", redirect_to);
        }

        let payload = serde_json::json!({
            "email": email,
        });

        let response = self
            .http_client
            .post(url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    /// Set a new password for the signed-in user
    pub async fn update_password(&self, new_password: &str) -> Result<User, AuthError> {
        let session = self.get_session().ok_or(AuthError::MissingSession)?;

        let payload = serde_json::json!({
            "password": new_password,
        });

        let response = self
            .http_client
            .put(self.endpoint("/user"))
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let user: User = check_status(response).await?.json().await?;
        Ok(user)
    }
}

async fn check_status(response: Response) -> Result<Response, AuthError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let error_text = response.text().await?;
    // The API reports failures as {"msg": ...} or {"error_description": ...}
    let message = serde_json::from_str::<Value>(&error_text)
        .ok()
        .and_then(|body| {
            ["msg", "error_description", "message"]
                .iter()
                .find_map(|key| body.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or(error_text);
    Err(AuthError::ApiError(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_body() -> Value {
        serde_json::json!({
            "access_token": "test_access_token",
            "refresh_token": "test_refresh_token",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": {
                "id": "test_user_id",
                "email": "test@example.com",
                "user_metadata": { "username": "tester" },
                "created_at": "2024-01-01T00:00:00Z"
            }
        })
    }

    fn auth_for(server: &MockServer) -> Auth {
        Auth::new(&server.uri(), "test_key", Client::new(), AuthOptions::default())
    }

    #[test]
    fn test_sign_up_with_session() {
        tokio_test::block_on(async {
            let mock_server = MockServer::start().await;

            Mock::given(method("POST"))
                .and(path("/auth/v1/signup"))
                .and(body_json(serde_json::json!({
                    "email": "test@example.com",
                    "password": "Password123",
                    "data": { "username": "tester" }
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(session_body()))
                .mount(&mock_server)
                .await;

            let auth = auth_for(&mock_server);
            let options = SignUpOptions {
                data: Some(serde_json::json!({ "username": "tester" })),
                email_redirect_to: None,
            };

            let outcome = auth
                .sign_up("test@example.com", "Password123", options)
                .await
                .unwrap();

            assert!(matches!(outcome, SignUpOutcome::SignedIn(_)));
            assert_eq!(auth.current_user_id().as_deref(), Some("test_user_id"));
        });
    }

    #[test]
    fn test_sign_up_requires_confirmation() {
        tokio_test::block_on(async {
            let mock_server = MockServer::start().await;

            Mock::given(method("POST"))
                .and(path("/auth/v1/signup"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "id": "pending_user",
                    "email": "new@example.com",
                    "confirmation_sent_at": "2024-01-01T00:00:00Z"
                })))
                .mount(&mock_server)
                .await;

            let auth = auth_for(&mock_server);
            let outcome = auth
                .sign_up("new@example.com", "Password123", SignUpOptions::default())
                .await
                .unwrap();

            match outcome {
                SignUpOutcome::ConfirmationRequired(user) => assert_eq!(user.id, "pending_user"),
                other => panic!("expected confirmation, got {:?}", other),
            }
            assert!(auth.get_session().is_none());
        });
    }

    #[tokio::test]
    async fn test_sign_in_and_sign_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body()))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .and(header("authorization", "Bearer test_access_token"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let auth = auth_for(&mock_server);
        let session = auth
            .sign_in_with_password("test@example.com", "Password123")
            .await
            .unwrap();
        assert_eq!(session.access_token, "test_access_token");

        auth.sign_out().await.unwrap();
        assert!(auth.get_session().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_error_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&mock_server)
            .await;

        let auth = auth_for(&mock_server);
        match auth.sign_in_with_password("a@b.co", "nope").await {
            Err(AuthError::ApiError(msg)) => assert_eq!(msg, "Invalid login credentials"),
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reset_password_redirect() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/recover"))
            .and(query_param("redirect_to", "outfitapp://reset-password"))
            .and(body_json(serde_json::json!({ "email": "test@example.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&mock_server)
            .await;

        let auth = auth_for(&mock_server);
        let result = auth
            .reset_password_for_email("test@example.com", Some("outfitapp://reset-password"))
            .await;
        assert!(result.is_ok(), "reset failed: {:?}", result.err());
    }

    #[tokio::test]
    async fn test_update_password_requires_session() {
        let auth = Auth::new("http://localhost", "k", Client::new(), AuthOptions::default());
        assert!(matches!(
            auth.update_password("Password123").await,
            Err(AuthError::MissingSession)
        ));
    }

    #[test]
    fn test_session_expiry() {
        let mut session: Session = serde_json::from_value(session_body()).unwrap();
        assert!(!session.is_expired());
        session.expires_at = Some(Utc::now().timestamp() - 10);
        assert!(session.is_expired());
    }
}
