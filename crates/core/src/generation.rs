//! Generation request model and upstream payload builder.
//!
//! A submission is collected into a [`GenerationDraft`], checked for its
//! required fields, and turned into an immutable [`GenerationRequest`] once
//! the media uploads have produced their [`UploadedFileRef`]s. The request
//! then projects into the JSON body expected by the upstream
//! `/chat-messages` endpoint ([`ChatPayload`]) and into the report columns
//! persisted after the stream completes.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/* --------------------------------------------------------------------------
Constants
-------------------------------------------------------------------------- */

/// Query sent upstream when the submission carries no edit instruction.
///
/// The upstream workflow keys off this exact string to start a new report.
pub const DEFAULT_QUERY: &str = "レポート作成開始";

/// Prefix prepended to an edit instruction to form the upstream query.
pub const EDIT_QUERY_PREFIX: &str = "内容: ";

/// Prefix of the summary column written alongside every report.
pub const SUMMARY_PREFIX: &str = "KPI目標: ";

/* --------------------------------------------------------------------------
Uploaded file references
-------------------------------------------------------------------------- */

/// Media kind accepted by the upstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Image,
    Video,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Video => "video",
        }
    }
}

/// How the upstream service should resolve the file reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMethod {
    /// The file was uploaded through the upstream upload endpoint.
    LocalFile,
}

/// A file already uploaded to the upstream service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFileRef {
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub transfer_method: TransferMethod,
    /// Opaque identifier returned by the upload endpoint.
    pub upload_file_id: String,
}

impl UploadedFileRef {
    /// Reference to a file uploaded via the upstream upload endpoint.
    pub fn local(kind: FileKind, upload_file_id: impl Into<String>) -> Self {
        Self {
            kind,
            transfer_method: TransferMethod::LocalFile,
            upload_file_id: upload_file_id.into(),
        }
    }
}

/* --------------------------------------------------------------------------
Draft and request
-------------------------------------------------------------------------- */

/// Scalar fields of a submission before uploads have run.
///
/// Every field is optional here; [`GenerationDraft::validate`] enforces the
/// required ones so a bad submission is rejected before any upload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationDraft {
    pub kpi_target: Option<String>,
    pub campaign_name: Option<String>,
    pub product_category: Option<String>,
    pub conversation_id: Option<String>,
    pub edit_instructions: Option<String>,
    pub comment: Option<String>,
    pub user_id: Option<DbId>,
}

impl GenerationDraft {
    /// Check that the required scalar fields are present and non-blank.
    pub fn validate(&self) -> Result<(), CoreError> {
        require("kpi_target", &self.kpi_target)?;
        require("campaign_name", &self.campaign_name)?;
        require("product_category", &self.product_category)?;
        Ok(())
    }

    /// Build the immutable request from the draft plus upload results.
    pub fn build(
        self,
        image: Option<UploadedFileRef>,
        video: Option<UploadedFileRef>,
    ) -> Result<GenerationRequest, CoreError> {
        let kpi_target = require("kpi_target", &self.kpi_target)?.to_string();
        let campaign_name = require("campaign_name", &self.campaign_name)?.to_string();
        let product_category = require("product_category", &self.product_category)?.to_string();

        Ok(GenerationRequest {
            kpi_target,
            campaign_name,
            product_category,
            image,
            video,
            edit_instructions: non_blank(self.edit_instructions),
            conversation_id: non_blank(self.conversation_id),
            comment: non_blank(self.comment),
            user_id: self.user_id,
        })
    }
}

fn require<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str, CoreError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(CoreError::Validation(format!(
            "Missing required field '{field}'"
        ))),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// One fully-assembled generation submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub kpi_target: String,
    pub campaign_name: String,
    pub product_category: String,
    pub image: Option<UploadedFileRef>,
    pub video: Option<UploadedFileRef>,
    pub edit_instructions: Option<String>,
    pub conversation_id: Option<String>,
    pub comment: Option<String>,
    pub user_id: Option<DbId>,
}

impl GenerationRequest {
    /// Upstream query string: the edit instruction if present, else the default.
    pub fn query(&self) -> String {
        match &self.edit_instructions {
            Some(instructions) => format!("{EDIT_QUERY_PREFIX}{instructions}"),
            None => DEFAULT_QUERY.to_string(),
        }
    }

    /// All uploaded file references, image first.
    pub fn files(&self) -> Vec<UploadedFileRef> {
        self.image.iter().chain(self.video.iter()).cloned().collect()
    }

    /// Build the JSON body for the upstream `/chat-messages` call.
    pub fn chat_payload(&self, actor: &str) -> ChatPayload {
        ChatPayload {
            inputs: ChatInputs {
                kpi_target: self.kpi_target.clone(),
                campaign_name: self.campaign_name.clone(),
                product_category: self.product_category.clone(),
                current_metrics_img: self.image.clone(),
                input_creative: self.video.clone(),
                comment: self.comment.clone(),
            },
            query: self.query(),
            user: actor.to_string(),
            response_mode: ResponseMode::Streaming,
            conversation_id: self.conversation_id.clone().unwrap_or_default(),
            files: self.files(),
        }
    }

    /// Title column of the persisted report.
    pub fn report_title(&self) -> &str {
        &self.campaign_name
    }

    /// Summary column of the persisted report.
    pub fn report_summary(&self) -> String {
        format!("{SUMMARY_PREFIX}{}", self.kpi_target)
    }
}

/* --------------------------------------------------------------------------
Upstream payload
-------------------------------------------------------------------------- */

/// Response delivery mode requested from the upstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    Streaming,
}

/// The `inputs` mapping of the upstream payload.
#[derive(Debug, Clone, Serialize)]
pub struct ChatInputs {
    pub kpi_target: String,
    pub campaign_name: String,
    pub product_category: String,
    /// Serialized as `null` when absent; the upstream workflow declares it.
    pub current_metrics_img: Option<UploadedFileRef>,
    pub input_creative: Option<UploadedFileRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// JSON body of the upstream `/chat-messages` call.
#[derive(Debug, Clone, Serialize)]
pub struct ChatPayload {
    pub inputs: ChatInputs,
    pub query: String,
    pub user: String,
    pub response_mode: ResponseMode,
    /// Empty string starts a new conversation.
    pub conversation_id: String,
    pub files: Vec<UploadedFileRef>,
}
