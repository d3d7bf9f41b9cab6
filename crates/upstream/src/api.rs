//! REST client for the upstream generation service.
//!
//! Wraps the two endpoints the relay needs, `POST /files/upload` and the
//! streaming `POST /chat-messages`, using [`reqwest`].

use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use report_core::generation::ChatPayload;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::config::UpstreamConfig;
use crate::error::{body_excerpt, UpstreamError};
use crate::service::{ByteStream, FileUpload, GenerationService};

/// Response returned by the upload endpoint.
#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    /// Server-assigned identifier of the uploaded file.
    pub id: String,
}

/// HTTP client for the upstream generation service.
#[derive(Debug)]
pub struct GenerationApi {
    client: reqwest::Client,
    base_url: Option<String>,
    api_key: Option<String>,
}

impl GenerationApi {
    /// Build a client from configuration.
    ///
    /// A missing endpoint or key is not an error here; it surfaces as
    /// [`UpstreamError::Configuration`] on the first call. An unreadable CA
    /// bundle is an error.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));

        if let Some(path) = &config.ca_cert_path {
            let pem = std::fs::read(path).map_err(|e| {
                UpstreamError::Trust(format!("cannot read {}: {e}", path.display()))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| UpstreamError::Trust(format!("invalid PEM in {}: {e}", path.display())))?;
            builder = builder
                .tls_built_in_root_certs(false)
                .add_root_certificate(cert);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .as_deref()
                .map(|url| url.trim_end_matches('/').to_string()),
            api_key: config.api_key.clone(),
        })
    }

    /// Resolve `(base_url, api_key)` or fail fast.
    fn endpoint(&self) -> Result<(&str, &str), UpstreamError> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or(UpstreamError::Configuration("GENERATION_API_BASE_URL"))?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::Configuration("GENERATION_API_KEY"))?;
        Ok((base_url, api_key))
    }

    /// Read the body of a failed response as an excerpt.
    async fn error_excerpt(response: reqwest::Response) -> String {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        body_excerpt(&body)
    }
}

#[async_trait]
impl GenerationService for GenerationApi {
    async fn upload_file(&self, upload: FileUpload, actor: &str) -> Result<String, UpstreamError> {
        let (base_url, api_key) = self.endpoint()?;

        tracing::debug!(
            kind = upload.kind.as_str(),
            file_name = %upload.file_name,
            size = upload.data.len(),
            "Uploading file to generation service",
        );

        let length = upload.data.len() as u64;
        let mut part = Part::stream_with_length(upload.data, length).file_name(upload.file_name);
        if let Some(content_type) = &upload.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new()
            .part("file", part)
            .text("user", actor.to_string());

        let response = self
            .client
            .post(format!("{base_url}/files/upload"))
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Upload {
                status: status.as_u16(),
                body: Self::error_excerpt(response).await,
            });
        }

        let uploaded: UploadResponse = response.json().await?;
        tracing::debug!(file_id = %uploaded.id, "File uploaded");
        Ok(uploaded.id)
    }

    async fn stream_chat(&self, payload: &ChatPayload) -> Result<ByteStream, UpstreamError> {
        let (base_url, api_key) = self.endpoint()?;

        let response = self
            .client
            .post(format!("{base_url}/chat-messages"))
            .bearer_auth(api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Stream {
                status: status.as_u16(),
                body: Self::error_excerpt(response).await,
            });
        }

        Ok(response.bytes_stream().map_err(UpstreamError::from).boxed())
    }
}
