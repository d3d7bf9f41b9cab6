//! Generation relay pipeline.
//!
//! A generation request runs in two stages:
//!
//! 1. [`uploads`] pushes the optional image and video to the upstream
//!    service, strictly one after the other, before the response starts.
//! 2. [`stream`] forwards the upstream event stream to the client byte for
//!    byte while decoding it on the side. When the terminal event arrives
//!    the completed report is handed to a [`ReportSink`] exactly once.

pub mod sink;
pub mod stream;
pub mod uploads;

pub use sink::{PgReportSink, ReportSink};
pub use stream::{spawn_relay, Relay, RelayOutcome};
pub use uploads::{upload_attachments, Attachments, UploadedAttachments};
