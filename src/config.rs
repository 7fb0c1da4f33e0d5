//! Configuration options for the wardrobe client

use std::env;
use std::time::Duration;

use crate::error::Error;

/// Configuration options for the wardrobe client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Whether to refresh an expired access token before remote calls
    pub auto_refresh_token: bool,

    /// Whether signed-in sessions are kept by the auth client
    pub persist_session: bool,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// The database schema
    pub db_schema: String,

    /// Table holding wardrobe items
    pub wardrobe_table: String,

    /// Table holding user profiles
    pub profiles_table: String,

    /// Bucket for wardrobe item photos
    pub wardrobe_bucket: String,

    /// Bucket for profile avatars
    pub avatar_bucket: String,

    /// Deep link the password recovery email points at
    pub password_reset_redirect: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            auto_refresh_token: true,
            persist_session: true,
            request_timeout: Some(Duration::from_secs(30)),
            db_schema: "public".to_string(),
            wardrobe_table: "wardrobe_items".to_string(),
            profiles_table: "profiles".to_string(),
            wardrobe_bucket: "wardrobe-items".to_string(),
            avatar_bucket: "avatars".to_string(),
            password_reset_redirect: Some("outfitapp://reset-password".to_string()),
        }
    }
}

impl ClientOptions {
    /// Set whether to automatically refresh the token
    pub fn with_auto_refresh_token(mut self, value: bool) -> Self {
        self.auto_refresh_token = value;
        self
    }

    /// Set whether to persist the session
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the database schema
    pub fn with_db_schema(mut self, value: &str) -> Self {
        self.db_schema = value.to_string();
        self
    }

    /// Set the wardrobe items table
    pub fn with_wardrobe_table(mut self, value: &str) -> Self {
        self.wardrobe_table = value.to_string();
        self
    }

    /// Set the profiles table
    pub fn with_profiles_table(mut self, value: &str) -> Self {
        self.profiles_table = value.to_string();
        self
    }

    /// Set the wardrobe photo bucket
    pub fn with_wardrobe_bucket(mut self, value: &str) -> Self {
        self.wardrobe_bucket = value.to_string();
        self
    }

    /// Set the avatar bucket
    pub fn with_avatar_bucket(mut self, value: &str) -> Self {
        self.avatar_bucket = value.to_string();
        self
    }

    /// Set the password recovery redirect
    pub fn with_password_reset_redirect(mut self, value: Option<&str>) -> Self {
        self.password_reset_redirect = value.map(str::to_string);
        self
    }
}

/// Project endpoint and key plus client options
#[derive(Debug, Clone)]
pub struct Config {
    pub url: String,
    pub anon_key: String,
    pub options: ClientOptions,
}

impl Config {
    const URL_VARS: [&'static str; 2] = ["SUPABASE_URL", "EXPO_PUBLIC_SUPABASE_URL"];
    const KEY_VARS: [&'static str; 2] = ["SUPABASE_ANON_KEY", "EXPO_PUBLIC_SUPABASE_ANON_KEY"];

    pub fn new(url: &str, anon_key: &str) -> Self {
        Self {
            url: url.to_string(),
            anon_key: anon_key.to_string(),
            options: ClientOptions::default(),
        }
    }

    /// Read the project settings from the environment, loading `.env` first
    pub fn from_env() -> Result<Self, Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| lookup(name).filter(|value| !value.trim().is_empty()))
        };

        let url = first(&Self::URL_VARS)
            .ok_or_else(|| Error::config(format!("{} must be set", Self::URL_VARS[0])))?;
        let anon_key = first(&Self::KEY_VARS)
            .ok_or_else(|| Error::config(format!("{} must be set", Self::KEY_VARS[0])))?;

        url::Url::parse(&url).map_err(|e| Error::config(format!("invalid project URL: {}", e)))?;

        Ok(Self::new(&url, &anon_key))
    }

    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn falls_back_to_expo_variables() {
        let config = Config::from_lookup(lookup(&[
            ("EXPO_PUBLIC_SUPABASE_URL", "https://project.example.co"),
            ("EXPO_PUBLIC_SUPABASE_ANON_KEY", "anon"),
        ]))
        .unwrap();
        assert_eq!(config.url, "https://project.example.co");
        assert_eq!(config.anon_key, "anon");
        assert_eq!(config.options.wardrobe_table, "wardrobe_items");
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let err = Config::from_lookup(lookup(&[("SUPABASE_URL", "https://p.example.co")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("SUPABASE_ANON_KEY")));
    }

    #[test]
    fn rejects_malformed_url() {
        let err = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "not a url"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
