//! Account flows: every request is validated locally before it reaches the
//! auth service

use log::{debug, error, info};
use serde_json::json;

use outfit_auth::{Auth, AuthError, Session, SignUpOptions, SignUpOutcome, User};

use crate::error::Error;
use crate::validation::{
    ForgotPasswordForm, FormSchema, ResetPasswordForm, SignInForm, SignUpForm,
};

#[derive(Debug, Clone)]
pub struct AccountService {
    auth: Auth,
    password_reset_redirect: Option<String>,
}

fn session_error(e: AuthError) -> Error {
    match e {
        AuthError::MissingSession => Error::NotAuthenticated,
        other => Error::Auth(other),
    }
}

impl AccountService {
    pub fn new(auth: Auth, password_reset_redirect: Option<&str>) -> Self {
        Self {
            auth,
            password_reset_redirect: password_reset_redirect.map(str::to_string),
        }
    }

    /// Register; the username, when given, is stored as user metadata
    pub async fn sign_up(&self, form: &SignUpForm) -> Result<SignUpOutcome, Error> {
        let data = form.validate()?;

        let options = SignUpOptions {
            data: data.username.as_ref().map(|username| json!({ "username": username })),
            ..SignUpOptions::default()
        };

        let outcome = self
            .auth
            .sign_up(&data.email, &data.password, options)
            .await
            .map_err(|e| {
                error!("[account] sign up failed: {}", e);
                Error::Auth(e)
            })?;

        if let SignUpOutcome::ConfirmationRequired(user) = &outcome {
            info!("[account] {} must confirm their email", user.id);
        }
        Ok(outcome)
    }

    pub async fn sign_in(&self, form: &SignInForm) -> Result<Session, Error> {
        let data = form.validate()?;
        self.auth
            .sign_in_with_password(&data.email, &data.password)
            .await
            .map_err(|e| {
                error!("[account] sign in failed: {}", e);
                Error::Auth(e)
            })
    }

    /// Sign out; succeeds when already signed out
    pub async fn sign_out(&self) -> Result<(), Error> {
        match self.auth.sign_out().await {
            Ok(()) => Ok(()),
            Err(AuthError::MissingSession) => {
                debug!("[account] sign out without a session");
                Ok(())
            }
            Err(e) => {
                error!("[account] sign out failed: {}", e);
                Err(Error::Auth(e))
            }
        }
    }

    /// Email a recovery link that opens the app's reset screen
    pub async fn request_password_reset(&self, form: &ForgotPasswordForm) -> Result<(), Error> {
        let email = form.validate()?;
        self.auth
            .reset_password_for_email(&email, self.password_reset_redirect.as_deref())
            .await
            .map_err(|e| {
                error!("[account] password reset request failed: {}", e);
                Error::Auth(e)
            })
    }

    /// Set a new password within the recovery session
    pub async fn reset_password(&self, form: &ResetPasswordForm) -> Result<User, Error> {
        let password = form.validate()?;
        self.auth.update_password(&password).await.map_err(|e| {
            error!("[account] password update failed: {}", e);
            session_error(e)
        })
    }
}
