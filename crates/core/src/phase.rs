//! Lifecycle of a single generation request.
//!
//! ```text
//! Idle -> Uploading(0..=2) -> Built -> Streaming -> Finished
//!                                         |
//!                                         +------> Aborted
//! ```
//!
//! Uploads and streaming can also abort. Transitions that do not appear in
//! the diagram are rejected with [`CoreError::Conflict`].

use std::fmt;

use crate::error::CoreError;

/// Maximum number of uploads a single request may perform (image + video).
pub const MAX_UPLOADS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationPhase {
    Idle,
    /// Uploads completed so far.
    Uploading(u8),
    Built,
    Streaming,
    /// The terminal frame arrived and persistence was attempted.
    Finished,
    Aborted,
}

impl GenerationPhase {
    /// Record one successful upload.
    pub fn uploaded(self) -> Result<Self, CoreError> {
        match self {
            Self::Idle => Ok(Self::Uploading(1)),
            Self::Uploading(n) if n < MAX_UPLOADS => Ok(Self::Uploading(n + 1)),
            other => Err(illegal(other, "uploaded")),
        }
    }

    /// The upstream payload has been assembled.
    pub fn built(self) -> Result<Self, CoreError> {
        match self {
            Self::Idle | Self::Uploading(_) => Ok(Self::Built),
            other => Err(illegal(other, "built")),
        }
    }

    /// The upstream stream is open and relaying.
    pub fn streaming(self) -> Result<Self, CoreError> {
        match self {
            Self::Built => Ok(Self::Streaming),
            other => Err(illegal(other, "streaming")),
        }
    }

    pub fn finished(self) -> Result<Self, CoreError> {
        match self {
            Self::Streaming => Ok(Self::Finished),
            other => Err(illegal(other, "finished")),
        }
    }

    /// Abort from any non-terminal phase.
    pub fn aborted(self) -> Result<Self, CoreError> {
        if self.is_terminal() {
            return Err(illegal(self, "aborted"));
        }
        Ok(Self::Aborted)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Aborted)
    }
}

impl fmt::Display for GenerationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Uploading(n) => write!(f, "uploading({n})"),
            Self::Built => f.write_str("built"),
            Self::Streaming => f.write_str("streaming"),
            Self::Finished => f.write_str("finished"),
            Self::Aborted => f.write_str("aborted"),
        }
    }
}

fn illegal(from: GenerationPhase, to: &str) -> CoreError {
    CoreError::Conflict(format!(
        "Illegal generation phase transition from {from} to {to}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn happy_path_with_two_uploads() {
        let phase = GenerationPhase::Idle
            .uploaded()
            .and_then(GenerationPhase::uploaded)
            .and_then(GenerationPhase::built)
            .and_then(GenerationPhase::streaming)
            .and_then(GenerationPhase::finished)
            .unwrap();
        assert_eq!(phase, GenerationPhase::Finished);
        assert!(phase.is_terminal());
    }

    #[test]
    fn build_without_uploads() {
        let phase = GenerationPhase::Idle.built().unwrap();
        assert_eq!(phase.streaming().unwrap(), GenerationPhase::Streaming);
    }

    #[test]
    fn third_upload_is_rejected() {
        let phase = GenerationPhase::Uploading(2);
        assert_matches!(phase.uploaded(), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn cannot_stream_before_build() {
        assert_matches!(
            GenerationPhase::Uploading(1).streaming(),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn abort_only_from_non_terminal() {
        assert_eq!(
            GenerationPhase::Streaming.aborted().unwrap(),
            GenerationPhase::Aborted
        );
        assert!(GenerationPhase::Finished.aborted().is_err());
        assert!(GenerationPhase::Aborted.aborted().is_err());
    }

    #[test]
    fn display() {
        assert_eq!(GenerationPhase::Uploading(1).to_string(), "uploading(1)");
        assert_eq!(GenerationPhase::Streaming.to_string(), "streaming");
    }
}
