//! Photo uploads for wardrobe items and profile avatars

use std::path::PathBuf;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use chrono::Utc;
use log::{debug, error};
use url::Url;

use outfit_auth::Auth;
use outfit_storage::{FileOptions, StorageClient};

use crate::error::Error;

const DEFAULT_EXTENSION: &str = "jpg";
const AVATAR_EXTENSIONS: [&str; 3] = ["jpg", "png", "webp"];

/// Where the image bytes come from
#[derive(Debug, Clone)]
pub enum ImageSource {
    Bytes {
        data: Bytes,
        extension: Option<String>,
    },
    /// Standard base64, as handed out by camera and picker plugins
    Base64 {
        data: String,
        extension: Option<String>,
    },
    /// A local file; the extension comes from its name
    File(PathBuf),
}

impl ImageSource {
    pub fn bytes(data: impl Into<Bytes>, extension: &str) -> Self {
        ImageSource::Bytes {
            data: data.into(),
            extension: Some(extension.to_string()),
        }
    }

    pub fn base64(data: &str, extension: &str) -> Self {
        ImageSource::Base64 {
            data: data.to_string(),
            extension: Some(extension.to_string()),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        ImageSource::File(path.into())
    }

    /// Lowercased file extension, `jpg` when unknown
    pub fn extension(&self) -> String {
        let extension = match self {
            ImageSource::Bytes { extension, .. } | ImageSource::Base64 { extension, .. } => {
                extension.clone()
            }
            ImageSource::File(path) => path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_string),
        };
        extension
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
    }

    /// Load the image bytes
    pub async fn read(self) -> Result<Bytes, Error> {
        match self {
            ImageSource::Bytes { data, .. } => Ok(data),
            ImageSource::Base64 { data, .. } => Ok(Bytes::from(STANDARD.decode(data.trim())?)),
            ImageSource::File(path) => Ok(Bytes::from(tokio::fs::read(path).await?)),
        }
    }
}

/// MIME type for an image extension; `jpg` is sent as `image/jpeg`
pub fn content_type(extension: &str) -> String {
    match extension {
        "jpg" => "image/jpeg".to_string(),
        other => format!("image/{}", other),
    }
}

/// Storage path of an item photo: `{user}/{item or upload time}.{ext}`
pub fn wardrobe_image_path(
    user_id: &str,
    item_id: Option<&str>,
    timestamp_ms: i64,
    extension: &str,
) -> String {
    match item_id {
        Some(item_id) => format!("{}/{}.{}", user_id, item_id, extension),
        None => format!("{}/{}.{}", user_id, timestamp_ms, extension),
    }
}

/// Storage path inside `bucket` of a public object URL, without the query
pub fn object_path_from_url(url: &str, bucket: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let marker = format!("/storage/v1/object/public/{}/", bucket);
    let (_, path) = url.path().split_once(&marker)?;
    if path.is_empty() {
        return None;
    }
    Some(path.to_string())
}

fn cache_busted(url: &str, timestamp_ms: i64) -> String {
    format!("{}?t={}", url, timestamp_ms)
}

/// A stored item photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub path: String,
    /// Public URL with a cache-busting query
    pub image_url: String,
    pub thumbnail_url: String,
}

/// Item photo storage used by the wardrobe manager
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload_wardrobe_image(
        &self,
        user_id: &str,
        source: ImageSource,
        item_id: Option<&str>,
    ) -> Result<UploadedImage, Error>;

    /// `false` on a malformed URL or a failed removal
    async fn delete_wardrobe_image(&self, url: &str) -> bool;
}

/// Item photos and avatars in object storage
#[derive(Debug, Clone)]
pub struct WardrobeImages {
    storage: StorageClient,
    auth: Auth,
    wardrobe_bucket: String,
    avatar_bucket: String,
}

impl WardrobeImages {
    pub fn new(
        storage: StorageClient,
        auth: Auth,
        wardrobe_bucket: &str,
        avatar_bucket: &str,
    ) -> Self {
        Self {
            storage,
            auth,
            wardrobe_bucket: wardrobe_bucket.to_string(),
            avatar_bucket: avatar_bucket.to_string(),
        }
    }

    /// Storage client acting as the signed-in user when there is one
    fn client(&self) -> StorageClient {
        match self.auth.get_session() {
            Some(session) => self.storage.clone().with_auth(&session.access_token),
            None => self.storage.clone(),
        }
    }

    /// Public URL of an item photo, without cache busting
    pub fn wardrobe_image_url(&self, path: &str) -> String {
        self.storage.from(&self.wardrobe_bucket).get_public_url(path)
    }

    /// Public URL of a user's avatar, defaulting to the jpg variant
    pub fn avatar_url(&self, user_id: &str, file_name: Option<&str>) -> String {
        let path = match file_name {
            Some(name) => name.to_string(),
            None => format!("{}/avatar.{}", user_id, DEFAULT_EXTENSION),
        };
        self.storage.from(&self.avatar_bucket).get_public_url(&path)
    }

    /// Upload a profile picture to `{user}/avatar.{ext}`, replacing any
    /// previous one, and return its cache-busted public URL
    pub async fn upload_avatar(&self, user_id: &str, source: ImageSource) -> Result<String, Error> {
        let extension = source.extension();
        let path = format!("{}/avatar.{}", user_id, extension);
        let data = source.read().await?;

        let client = self.client();
        let bucket = client.from(&self.avatar_bucket);
        let options = FileOptions::new()
            .with_content_type(&content_type(&extension))
            .with_upsert(true);

        bucket.upload(&path, data, options).await.map_err(|e| {
            error!("[avatar-storage] upload of {} failed: {}", path, e);
            e
        })?;

        Ok(cache_busted(
            &bucket.get_public_url(&path),
            Utc::now().timestamp_millis(),
        ))
    }

    /// Remove every avatar variant of a user
    pub async fn delete_avatar(&self, user_id: &str) -> bool {
        let paths: Vec<String> = AVATAR_EXTENSIONS
            .iter()
            .map(|ext| format!("{}/avatar.{}", user_id, ext))
            .collect();
        let paths: Vec<&str> = paths.iter().map(String::as_str).collect();

        match self.client().from(&self.avatar_bucket).remove(&paths).await {
            Ok(()) => true,
            Err(e) => {
                error!("[avatar-storage] delete for {} failed: {}", user_id, e);
                false
            }
        }
    }
}

#[async_trait]
impl ImageStore for WardrobeImages {
    async fn upload_wardrobe_image(
        &self,
        user_id: &str,
        source: ImageSource,
        item_id: Option<&str>,
    ) -> Result<UploadedImage, Error> {
        let timestamp = Utc::now().timestamp_millis();
        let extension = source.extension();
        let path = wardrobe_image_path(user_id, item_id, timestamp, &extension);
        let data = source.read().await?;

        let client = self.client();
        let bucket = client.from(&self.wardrobe_bucket);
        let options = FileOptions::new()
            .with_content_type(&content_type(&extension))
            .with_upsert(false);

        bucket.upload(&path, data, options).await.map_err(|e| {
            error!("[wardrobe-storage] upload of {} failed: {}", path, e);
            e
        })?;
        debug!("[wardrobe-storage] uploaded {}", path);

        let image_url = cache_busted(&bucket.get_public_url(&path), timestamp);
        Ok(UploadedImage {
            path,
            thumbnail_url: image_url.clone(),
            image_url,
        })
    }

    async fn delete_wardrobe_image(&self, url: &str) -> bool {
        let path = match object_path_from_url(url, &self.wardrobe_bucket) {
            Some(path) => path,
            None => {
                error!("[wardrobe-storage] not an image URL of this bucket: {}", url);
                return false;
            }
        };

        match self.client().from(&self.wardrobe_bucket).remove(&[path.as_str()]).await {
            Ok(()) => true,
            Err(e) => {
                error!("[wardrobe-storage] delete of {} failed: {}", path, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_defaults_to_jpg() {
        assert_eq!(ImageSource::file("/tmp/photo.PNG").extension(), "png");
        assert_eq!(ImageSource::file("/tmp/photo").extension(), "jpg");
        assert_eq!(ImageSource::bytes(vec![1u8], ".webp").extension(), "webp");
        assert_eq!(
            ImageSource::Bytes {
                data: Bytes::new(),
                extension: None
            }
            .extension(),
            "jpg"
        );
    }

    #[test]
    fn jpg_is_sent_as_jpeg() {
        assert_eq!(content_type("jpg"), "image/jpeg");
        assert_eq!(content_type("png"), "image/png");
    }

    #[test]
    fn paths_follow_user_prefix() {
        assert_eq!(wardrobe_image_path("u1", Some("item-9"), 5, "png"), "u1/item-9.png");
        assert_eq!(wardrobe_image_path("u1", None, 1700000000000, "jpg"), "u1/1700000000000.jpg");
    }

    #[test]
    fn path_is_read_back_from_public_url() {
        let url = "https://p.supabase.co/storage/v1/object/public/wardrobe-items/u1/a.jpg?t=17";
        assert_eq!(object_path_from_url(url, "wardrobe-items").as_deref(), Some("u1/a.jpg"));
        assert_eq!(object_path_from_url(url, "avatars"), None);
        assert_eq!(object_path_from_url("not a url", "wardrobe-items"), None);
    }

    #[tokio::test]
    async fn base64_and_files_are_read() {
        let source = ImageSource::base64("aGVsbG8=", "png");
        assert_eq!(source.read().await.unwrap(), Bytes::from_static(b"hello"));

        assert!(matches!(
            ImageSource::base64("***", "png").read().await,
            Err(Error::Base64(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shirt.jpg");
        std::fs::write(&path, b"jpeg bytes").unwrap();
        assert_eq!(
            ImageSource::file(&path).read().await.unwrap(),
            Bytes::from_static(b"jpeg bytes")
        );
    }
}
