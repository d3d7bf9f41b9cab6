//! Pure domain logic for the report relay service.
//!
//! Nothing in this crate performs I/O: it holds the shared id/timestamp
//! types, the domain error, the upstream payload builder, the SSE frame
//! decoder, the report accumulator, and the per-request phase machine.

pub mod accumulator;
pub mod error;
pub mod generation;
pub mod phase;
pub mod sse;
pub mod types;
