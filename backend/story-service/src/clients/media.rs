//! Image upload client.
//!
//! Posts the raw bytes as multipart form data to an unsigned-upload endpoint
//! (Cloudinary-compatible) and returns the durable URL from the response.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::MediaConfig;
use crate::error::{AppError, Result};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaUploader: Send + Sync {
    /// Upload one file and return its public URL.
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
}

pub struct HttpMediaUploader {
    http_client: Client,
    upload_url: String,
    upload_preset: String,
}

impl HttpMediaUploader {
    pub fn new(upload_url: &str, upload_preset: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            upload_url: upload_url.to_string(),
            upload_preset: upload_preset.to_string(),
        })
    }

    pub fn from_config(cfg: &MediaConfig) -> Result<Self> {
        Self::new(
            &cfg.upload_url,
            &cfg.upload_preset,
            Duration::from_secs(cfg.timeout_secs),
        )
    }
}

#[async_trait]
impl MediaUploader for HttpMediaUploader {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let size = bytes.len();
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()))
            .text("upload_preset", self.upload_preset.clone());

        let response = self
            .http_client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("image upload failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(file_name = file_name, status = %status, "Image upload rejected");
            return Err(AppError::Upstream(format!(
                "image upload returned status {status}"
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("invalid upload response: {e}")))?;

        let url = body
            .secure_url
            .or(body.url)
            .ok_or_else(|| AppError::Upstream("upload response carried no URL".into()))?;

        debug!(file_name = file_name, size = size, url = %url, "Image uploaded");
        Ok(url)
    }
}

/// Used when no upload endpoint is configured; every upload fails.
#[derive(Debug, Clone, Default)]
pub struct DisabledMediaUploader;

#[async_trait]
impl MediaUploader for DisabledMediaUploader {
    async fn upload(&self, _file_name: &str, _bytes: Vec<u8>) -> Result<String> {
        Err(AppError::Upstream("media upload is not configured".into()))
    }
}
