//! Handler for `POST /generations`, the streaming report generation endpoint.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use report_core::generation::{FileKind, GenerationDraft};
use report_core::phase::GenerationPhase;
use report_upstream::FileUpload;

use crate::error::{AppError, AppResult};
use crate::relay::{self, Attachments, PgReportSink};
use crate::state::AppState;

/// Content type of the relayed stream.
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream; charset=utf-8";

/// A parsed multipart submission.
#[derive(Debug, Default)]
pub struct Submission {
    pub draft: GenerationDraft,
    pub attachments: Attachments,
}

/// POST /api/v1/generations
///
/// Accepts a multipart form with the required text fields `kpi_target`,
/// `campaign_name` and `product_category`, the optional text fields
/// `conversation_id`, `edit_instructions`, `comment` and `user_id`, and the
/// optional files `current_metrics_img` (image) and `input_creative` (video).
///
/// Files are uploaded to the generation service first, image before video.
/// The upstream event stream is then relayed verbatim as the response body,
/// and the finished report is saved once the stream's terminal event arrives.
pub async fn generate(State(state): State<AppState>, multipart: Multipart) -> AppResult<Response> {
    let submission = read_submission(multipart).await?;
    submission.draft.validate()?;

    let actor = state.config.upstream.actor.as_str();
    let mut phase = GenerationPhase::Idle;

    let uploaded = relay::upload_attachments(
        state.generation.as_ref(),
        actor,
        submission.attachments,
        &mut phase,
    )
    .await?;

    let request = submission.draft.build(uploaded.image, uploaded.video)?;
    phase = phase.built()?;

    let upstream = state
        .generation
        .stream_chat(&request.chat_payload(actor))
        .await
        .map_err(|e| {
            tracing::warn!(phase = %phase, error = %e, "Generation request rejected");
            e
        })?;
    phase = phase.streaming()?;

    tracing::info!(
        campaign = %request.campaign_name,
        continuation = request.conversation_id.is_some(),
        files = request.files().len(),
        phase = %phase,
        "Relaying generation stream",
    );

    let sink = Arc::new(PgReportSink::new(state.pool.clone()));
    let relay = relay::spawn_relay(
        upstream,
        request,
        sink,
        state.config.upstream.idle_timeout(),
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, EVENT_STREAM_CONTENT_TYPE)
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(relay.body))
        .map_err(|e| AppError::InternalError(format!("Failed to build stream response: {e}")))
}

/// Collect the multipart form into a draft plus its media parts.
///
/// Unknown fields are ignored. File parts with no content count as absent.
pub async fn read_submission(mut multipart: Multipart) -> AppResult<Submission> {
    let mut submission = Submission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        let draft = &mut submission.draft;
        match name.as_str() {
            "kpi_target" => draft.kpi_target = Some(text(field).await?),
            "campaign_name" => draft.campaign_name = Some(text(field).await?),
            "product_category" => draft.product_category = Some(text(field).await?),
            "conversation_id" => draft.conversation_id = Some(text(field).await?),
            "edit_instructions" => draft.edit_instructions = Some(text(field).await?),
            "comment" => draft.comment = Some(text(field).await?),
            "user_id" => draft.user_id = parse_user_id(&text(field).await?)?,
            "current_metrics_img" => {
                submission.attachments.image = file(field, FileKind::Image).await?;
            }
            "input_creative" => {
                submission.attachments.video = file(field, FileKind::Video).await?;
            }
            _ => {} // ignore unknown fields
        }
    }

    Ok(submission)
}

async fn text(field: Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

async fn file(field: Field<'_>, kind: FileKind) -> AppResult<Option<FileUpload>> {
    let file_name = field
        .file_name()
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| kind.as_str().to_string());
    let content_type = field.content_type().map(str::to_string);
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if data.is_empty() {
        return Ok(None);
    }

    Ok(Some(FileUpload {
        kind,
        file_name,
        content_type,
        data,
    }))
}

/// Blank means anonymous; anything else must be a valid id.
fn parse_user_id(value: &str) -> AppResult<Option<report_core::types::DbId>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| AppError::BadRequest(format!("Invalid user_id '{value}'")))
}
