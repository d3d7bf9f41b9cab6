//! Client for the upstream generative AI service.
//!
//! Provides the upstream configuration, the [`GenerationService`] seam used
//! by the API layer, and [`GenerationApi`], its `reqwest`-backed
//! implementation (file upload plus the streaming chat endpoint).

pub mod api;
pub mod config;
pub mod error;
pub mod service;

pub use api::GenerationApi;
pub use config::UpstreamConfig;
pub use error::UpstreamError;
pub use service::{ByteStream, FileUpload, GenerationService};
