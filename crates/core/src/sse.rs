//! Server-sent-event frame decoder for the upstream generation stream.
//!
//! The upstream service sends frames of the form `data: <json>\n\n`. Byte
//! chunks arrive with arbitrary boundaries, so [`SseDecoder`] buffers raw
//! bytes until a full frame (terminated by a blank line) is available and
//! only then decodes it. Frames without any `data:` line (comments, `event:`
//! keep-alives) produce nothing.

use serde::Deserialize;

/// Maximum number of payload characters kept in a [`FrameError`].
const ERROR_EXCERPT_CHARS: usize = 200;

/// Largest frame the decoder will buffer before giving up on it.
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

/// Trailing bytes rescanned on the next push; one less than the longest delimiter.
const DELIMITER_OVERLAP: usize = 3;

/// A decoded upstream event.
///
/// Tagged on the `event` field. Unknown event names map to [`StreamEvent::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event")]
pub enum StreamEvent {
    /// An incremental text fragment.
    #[serde(rename = "message")]
    Message {
        answer: String,
        #[serde(default)]
        conversation_id: Option<String>,
    },

    /// The generation is complete.
    #[serde(rename = "message_end")]
    MessageEnd {
        #[serde(default)]
        conversation_id: Option<String>,
    },

    #[serde(other)]
    Other,
}

/// A single frame that could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("frame payload is not a valid event ({source}): {excerpt}")]
    Json {
        source: serde_json::Error,
        excerpt: String,
    },

    #[error("frame exceeds {limit} bytes and was dropped")]
    Oversized { limit: usize },
}

/// Incremental SSE decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    /// Offset up to which `buf` is known to hold no delimiter.
    scanned: usize,
    /// Dropping the rest of an oversized frame until its delimiter.
    discarding: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw chunk and decode every frame it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<StreamEvent, FrameError>> {
        self.buf.extend_from_slice(chunk);

        let mut decoded = Vec::new();
        while let Some((end, delim_len)) = find_frame_end(&self.buf, self.scanned) {
            let frame: Vec<u8> = self.buf.drain(..end + delim_len).take(end).collect();
            self.scanned = 0;
            if std::mem::take(&mut self.discarding) {
                continue;
            }
            if let Some(result) = decode_frame(&frame) {
                decoded.push(result);
            }
        }
        self.scanned = self.buf.len().saturating_sub(DELIMITER_OVERLAP);

        if self.discarding || self.buf.len() > MAX_FRAME_BYTES {
            if !self.discarding {
                decoded.push(Err(FrameError::Oversized {
                    limit: MAX_FRAME_BYTES,
                }));
                self.discarding = true;
            }
            self.buf.drain(..self.scanned);
            self.scanned = 0;
        }
        decoded
    }

    /// Decode whatever is left once the upstream stream has ended.
    pub fn finish(&mut self) -> Option<Result<StreamEvent, FrameError>> {
        let rest = std::mem::take(&mut self.buf);
        self.scanned = 0;
        if std::mem::take(&mut self.discarding) {
            return None;
        }
        decode_frame(&rest)
    }

    /// Number of buffered bytes not yet forming a complete frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Locate the earliest blank-line delimiter at or after `from`, returning
/// `(frame_len, delimiter_len)`.
fn find_frame_end(buf: &[u8], from: usize) -> Option<(usize, usize)> {
    (from..buf.len()).find_map(|i| {
        let rest = &buf[i..];
        if rest.starts_with(b"\n\n") {
            Some((i, 2))
        } else if rest.starts_with(b"\r\n\r\n") {
            Some((i, 4))
        } else {
            None
        }
    })
}

/// Decode one frame. Returns `None` when the frame carries no `data:` line.
fn decode_frame(frame: &[u8]) -> Option<Result<StreamEvent, FrameError>> {
    let text = match std::str::from_utf8(frame) {
        Ok(text) => text,
        Err(e) => return Some(Err(FrameError::Utf8(e))),
    };

    let data: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
        .collect();

    if data.is_empty() {
        return None;
    }

    let payload = data.join("\n");
    Some(
        serde_json::from_str(&payload).map_err(|source| FrameError::Json {
            source,
            excerpt: payload.chars().take(ERROR_EXCERPT_CHARS).collect(),
        }),
    )
}
