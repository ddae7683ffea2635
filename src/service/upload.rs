//! Avatar Storage
//!
//! Stores uploaded avatar images and returns the public URL to save on the
//! account. Two backends: Cloudinary and a local directory served by the app.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{multipart, Client as HttpClient};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{AvatarBackend, AvatarConfig};
use crate::utils::error::{AppError, AppResult};
use crate::utils::security::{generate_secure_token, sha256_hex};

/// Avatars are cropped to this square size
pub const AVATAR_SIZE: u32 = 250;

/// URL prefix under which local avatars are served
pub const LOCAL_AVATAR_ROUTE: &str = "/static/avatars";

/// An uploaded image as received from the multipart form
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

/// Extensions an avatar may be stored under
pub const AVATAR_EXTENSIONS: [&str; 4] = ["png", "jpg", "gif", "webp"];

impl AvatarUpload {
    /// File extension for the upload, rejecting anything that is not an image
    ///
    /// The part's content type decides; a missing or generic one falls back
    /// to the extension of the uploaded file name.
    pub fn extension(&self) -> AppResult<&'static str> {
        if self.bytes.is_empty() {
            return Err(AppError::Validation("Avatar file is empty".to_string()));
        }

        let declared = match self.content_type.as_deref() {
            None | Some("application/octet-stream") => None,
            Some(content_type) => Some(content_type),
        };

        let extension = match declared {
            Some("image/png") => Some("png"),
            Some("image/jpeg") | Some("image/jpg") => Some("jpg"),
            Some("image/gif") => Some("gif"),
            Some("image/webp") => Some("webp"),
            Some(_) => None,
            None => self.file_name_extension(),
        };

        extension.ok_or_else(|| {
            AppError::Validation(format!(
                "Unsupported avatar type '{}', expected png, jpeg, gif or webp",
                declared.unwrap_or("unknown")
            ))
        })
    }

    fn file_name_extension(&self) -> Option<&'static str> {
        let (_, ext) = self.file_name.as_deref()?.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some("png"),
            "jpg" | "jpeg" => Some("jpg"),
            "gif" => Some("gif"),
            "webp" => Some("webp"),
            _ => None,
        }
    }
}

/// Storage backend for avatar images
#[async_trait]
pub trait AvatarStorage: Send + Sync {
    /// Stores the image for `username`, replacing any previous one, and returns its URL
    async fn store_avatar(&self, username: &str, upload: AvatarUpload) -> AppResult<String>;
}

/// Build the configured backend
pub fn storage_from_config(config: &AvatarConfig, base_url: &str) -> Arc<dyn AvatarStorage> {
    match &config.backend {
        AvatarBackend::Local { dir } => Arc::new(LocalAvatarStorage::new(dir.clone(), base_url)),
        AvatarBackend::Cloudinary {
            cloud_name,
            api_key,
            api_secret,
        } => Arc::new(CloudinaryStorage::new(
            cloud_name.clone(),
            api_key.clone(),
            api_secret.clone(),
        )),
    }
}

/// Writes avatars to a directory; the router serves it at [`LOCAL_AVATAR_ROUTE`]
pub struct LocalAvatarStorage {
    dir: PathBuf,
    base_url: String,
}

impl LocalAvatarStorage {
    pub fn new(dir: PathBuf, base_url: &str) -> Self {
        Self {
            dir,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AvatarStorage for LocalAvatarStorage {
    async fn store_avatar(&self, username: &str, upload: AvatarUpload) -> AppResult<String> {
        let extension = upload.extension()?;
        let file_name = format!("{}.{}", username, extension);

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            AppError::Internal(format!("Failed to create avatar directory: {}", e))
        })?;

        tokio::fs::write(self.dir.join(&file_name), &upload.bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write avatar: {}", e)))?;

        // A previous avatar of another type would otherwise linger
        for stale in AVATAR_EXTENSIONS.iter().filter(|ext| **ext != extension) {
            let path = self.dir.join(format!("{}.{}", username, stale));
            match tokio::fs::remove_file(&path).await {
                Ok(()) => log::info!("Removed previous avatar {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("Failed to remove previous avatar {}: {}", path.display(), e),
            }
        }

        log::info!("Stored avatar for {} as {}", username, file_name);

        // The version query keeps caches from serving the replaced image
        Ok(format!(
            "{}{}/{}?v={}",
            self.base_url,
            LOCAL_AVATAR_ROUTE,
            file_name,
            generate_secure_token(8)
        ))
    }
}

#[derive(Debug, Deserialize)]
struct CloudinaryUploadResponse {
    version: u64,
}

/// Signed uploads to Cloudinary under `RestApp/{username}`
pub struct CloudinaryStorage {
    http_client: HttpClient,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl CloudinaryStorage {
    pub fn new(cloud_name: String, api_key: String, api_secret: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            cloud_name,
            api_key,
            api_secret,
        }
    }

    pub fn public_id(username: &str) -> String {
        format!("RestApp/{}", username)
    }

    /// SHA-256 request signature over the sorted signed parameters
    pub fn sign(&self, params: &[(&str, String)]) -> String {
        let mut params = params.to_vec();
        params.sort_by(|a, b| a.0.cmp(b.0));

        let joined = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");

        sha256_hex(&format!("{}{}", joined, self.api_secret))
    }

    /// Delivery URL with the square fill transformation
    pub fn delivery_url(&self, public_id: &str, version: u64) -> String {
        format!(
            "https://res.cloudinary.com/{}/image/upload/c_fill,h_{size},w_{size}/v{}/{}",
            self.cloud_name,
            version,
            public_id,
            size = AVATAR_SIZE
        )
    }
}

#[async_trait]
impl AvatarStorage for CloudinaryStorage {
    async fn store_avatar(&self, username: &str, upload: AvatarUpload) -> AppResult<String> {
        let extension = upload.extension()?;
        let public_id = Self::public_id(username);
        let timestamp = Utc::now().timestamp().to_string();

        let signature = self.sign(&[
            ("overwrite", "true".to_string()),
            ("public_id", public_id.clone()),
            ("timestamp", timestamp.clone()),
        ]);

        let mut file_part = multipart::Part::bytes(upload.bytes)
            .file_name(format!("{}.{}", username, extension));
        if let Some(content_type) = &upload.content_type {
            file_part = file_part
                .mime_str(content_type)
                .map_err(|e| AppError::Validation(format!("Invalid content type: {}", e)))?;
        }

        let form = multipart::Form::new()
            .part("file", file_part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("public_id", public_id.clone())
            .text("overwrite", "true")
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self
            .http_client
            .post(format!(
                "https://api.cloudinary.com/v1_1/{}/image/upload",
                self.cloud_name
            ))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Cloudinary upload failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("Cloudinary rejected avatar for {}: {} {}", username, status, body);
            return Err(AppError::ExternalService(format!(
                "Cloudinary returned error: {}",
                status
            )));
        }

        let uploaded: CloudinaryUploadResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse Cloudinary response: {}", e))
        })?;

        log::info!("Uploaded avatar for {} to Cloudinary", username);
        Ok(self.delivery_url(&public_id, uploaded.version))
    }
}
