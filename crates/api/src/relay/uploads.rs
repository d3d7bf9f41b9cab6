//! Sequential media uploads ahead of the chat call.

use report_core::generation::{FileKind, UploadedFileRef};
use report_core::phase::GenerationPhase;
use report_upstream::{FileUpload, GenerationService};

use crate::error::AppResult;

/// Media parts taken from the submission. Empty parts are already dropped.
#[derive(Debug, Default)]
pub struct Attachments {
    pub image: Option<FileUpload>,
    pub video: Option<FileUpload>,
}

/// Upstream references for whatever was uploaded.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UploadedAttachments {
    pub image: Option<UploadedFileRef>,
    pub video: Option<UploadedFileRef>,
}

/// Upload the image, then the video.
///
/// The video upload does not start until the image upload has returned, and
/// the first failure aborts the request before any chat call is made.
pub async fn upload_attachments(
    service: &dyn GenerationService,
    actor: &str,
    attachments: Attachments,
    phase: &mut GenerationPhase,
) -> AppResult<UploadedAttachments> {
    let mut uploaded = UploadedAttachments::default();

    if let Some(image) = attachments.image {
        uploaded.image = Some(upload_one(service, actor, image, phase).await?);
    }
    if let Some(video) = attachments.video {
        uploaded.video = Some(upload_one(service, actor, video, phase).await?);
    }

    Ok(uploaded)
}

async fn upload_one(
    service: &dyn GenerationService,
    actor: &str,
    upload: FileUpload,
    phase: &mut GenerationPhase,
) -> AppResult<UploadedFileRef> {
    let kind: FileKind = upload.kind;
    let file_id = service.upload_file(upload, actor).await.map_err(|e| {
        tracing::warn!(kind = kind.as_str(), phase = %phase, error = %e, "Upload failed");
        e
    })?;
    *phase = phase.uploaded()?;
    Ok(UploadedFileRef::local(kind, file_id))
}
