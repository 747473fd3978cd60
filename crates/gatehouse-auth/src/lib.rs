//! # Gatehouse Auth
//!
//! Token claims and signing utilities for the Gatehouse admin API.
//!
//! This crate provides:
//!
//! - [`claims`]: the claim set carried by every token and its [`TokenKind`]
//! - [`jwt`]: [`TokenCodec`], which issues and verifies HS256-signed tokens
//! - [`error`]: [`TokenError`], the verification failure taxonomy
//!
//! # Token Types
//!
//! Two tokens are issued per successful login, with independent lifetimes:
//!
//! - **Access Token**: short-lived bearer credential for API calls
//! - **Refresh Token**: long-lived credential exchanged for a new access token
//!
//! The kind is a signed claim, so a token of one kind is rejected where the
//! other is expected.
//!
//! # Example
//!
//! ```ignore
//! use gatehouse_auth::{TokenCodec, TokenKind};
//! use gatehouse_config::JwtConfig;
//!
//! let codec = TokenCodec::new(&JwtConfig::from_env());
//!
//! let token = codec.issue_access_token(42, "alice", "admin")?;
//! let claims = codec.verify(&token, TokenKind::Access)?;
//! assert_eq!(claims.user_id, 42);
//! ```

pub mod claims;
pub mod error;
pub mod jwt;

// Re-export commonly used types at crate root
pub use claims::{Claims, TokenKind};
pub use error::TokenError;
pub use jwt::TokenCodec;
