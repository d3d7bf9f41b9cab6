/// Maximum number of characters of an upstream error body kept for callers.
pub const BODY_EXCERPT_CHARS: usize = 500;

/// Errors from the upstream generation service layer.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// A required endpoint or credential is missing; raised before any network call.
    #[error("Generation service is not configured: {0} is not set")]
    Configuration(&'static str),

    /// The configured trust anchor could not be loaded.
    #[error("Invalid generation service TLS configuration: {0}")]
    Trust(String),

    /// The upload endpoint returned a non-2xx status code.
    #[error("File upload failed with status {status}: {body}")]
    Upload { status: u16, body: String },

    /// The chat endpoint returned a non-2xx status code.
    #[error("Generation request failed with status {status}: {body}")]
    Stream { status: u16, body: String },

    /// The HTTP request itself failed (network, DNS, TLS, body read, etc.).
    #[error("HTTP request to generation service failed: {0}")]
    Request(#[from] reqwest::Error),

    /// No bytes arrived from the open stream within the idle timeout.
    #[error("Generation service sent no data for {0} seconds")]
    IdleTimeout(u64),
}

/// Reduce an upstream error body to a short human-readable excerpt.
///
/// JSON bodies carrying a `message` string are reduced to that message.
pub fn body_excerpt(body: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string));

    let text = message.unwrap_or_else(|| body.trim().to_string());
    if text.chars().count() <= BODY_EXCERPT_CHARS {
        text
    } else {
        let mut cut: String = text.chars().take(BODY_EXCERPT_CHARS).collect();
        cut.push_str("...");
        cut
    }
}
