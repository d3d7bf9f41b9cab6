//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- stateless JWT access-token generation and validation.

pub mod jwt;
pub mod password;
