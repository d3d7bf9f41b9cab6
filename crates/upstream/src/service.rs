//! The seam between the relay pipeline and the upstream service.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use report_core::generation::{ChatPayload, FileKind};

use crate::error::UpstreamError;

/// Raw body of an open upstream event stream.
pub type ByteStream = BoxStream<'static, Result<Bytes, UpstreamError>>;

/// A media file received from the client, ready for upload.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub kind: FileKind,
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Operations the relay needs from the upstream generation service.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Upload one file on behalf of `actor`, returning the remote file id.
    async fn upload_file(&self, upload: FileUpload, actor: &str) -> Result<String, UpstreamError>;

    /// Start a streaming generation. Fails if the upstream rejects the call
    /// before any body bytes are available.
    async fn stream_chat(&self, payload: &ChatPayload) -> Result<ByteStream, UpstreamError>;
}
