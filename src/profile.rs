//! The signed-in user's profile row

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::watch;

use outfit_auth::{Auth, Session};

use crate::error::{DecodeError, Error};
use crate::images::{ImageSource, WardrobeImages};
use crate::store::Store;
use crate::tables::TableFactory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn decode(row: Value) -> Result<Self, DecodeError> {
        if !row.is_object() {
            return Err(DecodeError::new("profile", None, "expected a JSON object"));
        }
        let id = row.get("id").and_then(Value::as_str).map(str::to_string);
        serde_json::from_value(row).map_err(|e| DecodeError::new("profile", id, e))
    }

    /// Decode a single-row representation; arrays must hold exactly one row
    pub fn decode_single(body: Value) -> Result<Option<Self>, DecodeError> {
        match body {
            Value::Null => Ok(None),
            Value::Array(rows) if rows.len() > 1 => Err(DecodeError::new(
                "profile",
                None,
                "expected a single row, got several",
            )),
            Value::Array(rows) => rows.into_iter().next().map(Self::decode).transpose(),
            row => Self::decode(row).map(Some),
        }
    }
}

/// Partial profile change; only `Some` fields are sent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileState {
    pub profile: Option<Profile>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Username for a fresh profile: the local part of the account email
pub fn default_username(email: Option<&str>) -> Option<String> {
    let local = email?.split('@').next()?;
    (!local.is_empty()).then(|| local.to_string())
}

pub struct ProfileManager {
    tables: TableFactory,
    table: String,
    auth: Auth,
    images: WardrobeImages,
    state: Store<ProfileState>,
    generation: AtomicU64,
}

impl ProfileManager {
    pub fn new(tables: TableFactory, table: &str, auth: Auth, images: WardrobeImages) -> Self {
        Self {
            tables,
            table: table.to_string(),
            auth,
            images,
            state: Store::default(),
            generation: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> ProfileState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProfileState> {
        self.state.subscribe()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.state.read(|s| s.profile.clone())
    }

    async fn session(&self) -> Option<Session> {
        match self.auth.ensure_fresh_session().await {
            Ok(session) => session,
            Err(e) => {
                error!("[profile] session refresh failed: {}", e);
                self.auth.get_session()
            }
        }
    }

    fn apply(&self, generation: u64, f: impl FnOnce(&mut ProfileState)) {
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("[profile] discarding response of superseded fetch {}", generation);
            return;
        }
        self.state.update(f);
    }

    /// Load the profile, creating it on first use.
    ///
    /// Without a signed-in user the held profile is cleared.
    pub async fn fetch(&self) -> Result<(), Error> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(session) = self.session().await else {
            self.apply(generation, |s| {
                s.profile = None;
                s.is_loading = false;
                s.error = None;
            });
            return Ok(());
        };

        self.apply(generation, |s| {
            s.is_loading = true;
            s.error = None;
        });

        match self.load_or_create(&session).await {
            Ok(profile) => {
                self.apply(generation, |s| {
                    s.profile = Some(profile);
                    s.is_loading = false;
                });
                Ok(())
            }
            Err(e) => {
                error!("[profile] fetch failed: {}", e);
                let message = e.to_string();
                self.apply(generation, |s| {
                    s.error = Some(message);
                    s.is_loading = false;
                });
                Err(e)
            }
        }
    }

    pub async fn refetch(&self) -> Result<(), Error> {
        self.fetch().await
    }

    async fn load_or_create(&self, session: &Session) -> Result<Profile, Error> {
        let token = Some(session.access_token.as_str());
        let user = &session.user;

        let found = self
            .tables
            .table(&self.table, token)?
            .select("*")
            .eq("id", &user.id)
            .execute_single::<Value>()
            .await;

        match found {
            Ok(row) => Ok(Profile::decode(row)?),
            Err(e) if e.is_not_found() => {
                info!("[profile] creating profile for {}", user.id);
                let row = json!({
                    "id": user.id,
                    "username": default_username(user.email.as_deref()),
                    "full_name": null,
                    "avatar_url": null,
                    "bio": null,
                });
                let body = self.tables.table(&self.table, token)?.insert(&row).await?;
                Profile::decode_single(body)?
                    .ok_or_else(|| Error::general("Profile insert returned no row"))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Apply `changes` to the signed-in user's profile
    pub async fn update(&self, changes: ProfileUpdate) -> Result<Profile, Error> {
        let session = self.session().await.ok_or(Error::NotAuthenticated)?;

        let mut row = serde_json::to_value(&changes).map_err(Error::general)?;
        if let Value::Object(fields) = &mut row {
            fields.insert(
                "updated_at".to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }

        match self.write(&session, &row).await {
            Ok(profile) => {
                let held = profile.clone();
                self.state.update(|s| s.profile = Some(held));
                Ok(profile)
            }
            Err(e) => {
                error!("[profile] update failed: {}", e);
                Err(e)
            }
        }
    }

    async fn write(&self, session: &Session, row: &Value) -> Result<Profile, Error> {
        let body = self
            .tables
            .table(&self.table, Some(&session.access_token))?
            .eq("id", &session.user.id)
            .update(row)
            .await?;
        Profile::decode_single(body)?
            .ok_or_else(|| Error::not_found(format!("profile {}", session.user.id)))
    }

    /// Upload a new avatar and point the profile at it
    pub async fn update_avatar(&self, source: ImageSource) -> Result<Profile, Error> {
        let user_id = self
            .session()
            .await
            .map(|s| s.user.id)
            .ok_or(Error::NotAuthenticated)?;

        let avatar_url = self.images.upload_avatar(&user_id, source).await?;
        self.update(ProfileUpdate {
            avatar_url: Some(avatar_url),
            ..ProfileUpdate::default()
        })
        .await
    }

    /// Remove the avatar images and clear the profile's avatar URL
    pub async fn remove_avatar(&self) -> Result<Profile, Error> {
        let session = self.session().await.ok_or(Error::NotAuthenticated)?;

        if !self.images.delete_avatar(&session.user.id).await {
            return Err(Error::general("Could not delete avatar"));
        }

        // Clearing needs an explicit null, which `ProfileUpdate` never sends.
        let row = json!({
            "avatar_url": null,
            "updated_at": Utc::now().to_rfc3339(),
        });
        let profile = self.write(&session, &row).await.map_err(|e| {
            error!("[profile] clearing avatar failed: {}", e);
            e
        })?;

        let held = profile.clone();
        self.state.update(|s| s.profile = Some(held));
        Ok(profile)
    }
}
