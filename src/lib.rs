//! Outfit wardrobe client
//!
//! Form validation for the account, profile and item screens plus an
//! observable manager for the signed-in user's wardrobe, backed by the
//! hosted table, storage and auth APIs.
//!
//! Everything hangs off one explicitly constructed [`Outfit`] value; there
//! is no global client.

pub mod account;
pub mod config;
pub mod error;
pub mod images;
pub mod models;
pub mod profile;
pub mod repository;
pub mod store;
pub mod tables;
pub mod validation;
pub mod wardrobe;

use std::sync::Arc;

use reqwest::Client;

use outfit_auth::{Auth, AuthOptions};
use outfit_postgrest::PostgrestClient;
use outfit_storage::StorageClient;

use crate::account::AccountService;
use crate::config::{ClientOptions, Config};
use crate::error::Error;
use crate::images::WardrobeImages;
use crate::profile::ProfileManager;
use crate::repository::PostgrestWardrobeRepository;
use crate::tables::TableFactory;
use crate::wardrobe::WardrobeManager;

pub use outfit_auth;
pub use outfit_postgrest;
pub use outfit_storage;

/// Entry point owning the shared HTTP pool and auth session
#[derive(Debug, Clone)]
pub struct Outfit {
    /// The base URL of the backend project
    pub url: String,
    /// The anonymous API key of the project
    pub key: String,
    /// HTTP client shared by every service client
    pub http_client: Client,
    /// Auth client; clones share the session
    pub auth: Auth,
    pub options: ClientOptions,
    tables: TableFactory,
}

impl Outfit {
    /// Create a client with default options
    ///
    /// # Example
    ///
    /// ```
    /// use outfit_wardrobe::Outfit;
    ///
    /// let outfit = Outfit::new("https://your-project.supabase.co", "your-anon-key").unwrap();
    /// assert!(outfit.auth().get_session().is_none());
    /// ```
    pub fn new(url: &str, key: &str) -> Result<Self, Error> {
        Self::new_with_options(url, key, ClientOptions::default())
    }

    /// Create a client with custom options
    ///
    /// # Example
    ///
    /// ```
    /// use outfit_wardrobe::{config::ClientOptions, Outfit};
    ///
    /// let options = ClientOptions::default().with_wardrobe_table("closet_items");
    /// let outfit = Outfit::new_with_options(
    ///     "https://your-project.supabase.co",
    ///     "your-anon-key",
    ///     options,
    /// )
    /// .unwrap();
    /// assert_eq!(outfit.options.wardrobe_table, "closet_items");
    /// ```
    pub fn new_with_options(url: &str, key: &str, options: ClientOptions) -> Result<Self, Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let url = url.trim_end_matches('/').to_string();
        let auth = Auth::new(
            &url,
            key,
            http_client.clone(),
            AuthOptions {
                auto_refresh_token: options.auto_refresh_token,
                persist_session: options.persist_session,
            },
        );
        let tables =
            TableFactory::new(&url, key, http_client.clone()).with_schema(&options.db_schema);

        Ok(Self {
            url,
            key: key.to_string(),
            http_client,
            auth,
            options,
            tables,
        })
    }

    /// Create a client from a loaded [`Config`]
    pub fn from_config(config: Config) -> Result<Self, Error> {
        Self::new_with_options(&config.url, &config.anon_key, config.options)
    }

    /// Create a client from the environment, see [`Config::from_env`]
    pub fn from_env() -> Result<Self, Error> {
        Self::from_config(Config::from_env()?)
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Table client for `table`, authorized as the signed-in user if any
    pub fn from(&self, table: &str) -> Result<PostgrestClient, Error> {
        let session = self.auth.get_session();
        Ok(self
            .tables
            .table(table, session.as_ref().map(|s| s.access_token.as_str()))?)
    }

    /// Object storage, authorized as the signed-in user if any
    pub fn storage(&self) -> StorageClient {
        let storage = StorageClient::new(&self.url, &self.key, self.http_client.clone());
        match self.auth.get_session() {
            Some(session) => storage.with_auth(&session.access_token),
            None => storage,
        }
    }

    /// Item photo and avatar storage
    pub fn images(&self) -> WardrobeImages {
        WardrobeImages::new(
            StorageClient::new(&self.url, &self.key, self.http_client.clone()),
            self.auth.clone(),
            &self.options.wardrobe_bucket,
            &self.options.avatar_bucket,
        )
    }

    /// A new wardrobe manager for the signed-in user
    pub fn wardrobe(&self) -> WardrobeManager {
        let repository =
            PostgrestWardrobeRepository::new(self.tables.clone(), &self.options.wardrobe_table);
        WardrobeManager::new(Arc::new(repository), self.auth.clone())
            .with_images(Arc::new(self.images()))
    }

    /// A new profile manager for the signed-in user
    pub fn profiles(&self) -> ProfileManager {
        ProfileManager::new(
            self.tables.clone(),
            &self.options.profiles_table,
            self.auth.clone(),
            self.images(),
        )
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(
            self.auth.clone(),
            self.options.password_reset_redirect.as_deref(),
        )
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::{ClientOptions, Config};
    pub use crate::error::Error;
    pub use crate::images::{ImageSource, ImageStore};
    pub use crate::models::{
        Category, ClassificationSource, NewWardrobeItem, SortDirection, SortField, WarmthLevel,
        WardrobeFilters, WardrobeItem, WardrobeItemUpdate, WardrobeSortOptions,
        WeatherResistance,
    };
    pub use crate::profile::{Profile, ProfileUpdate};
    pub use crate::validation::{FieldSchema, FormSchema, ValidationErrors};
    pub use crate::wardrobe::{WardrobeManager, WardrobeState};
    pub use crate::Outfit;
}
