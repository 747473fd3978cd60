//! Claim set embedded in every token.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which slot a token was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

/// Identity claim carried by access and refresh tokens.
///
/// `role` is informational only. Authorization always resolves the user's
/// current role from the store, so a role change applies to tokens that
/// were issued before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub role: String,
    /// Expiration timestamp (Unix seconds)
    pub exp: i64,
    /// Issued-at timestamp (Unix seconds)
    pub iat: i64,
    /// Not-before timestamp (Unix seconds), equal to `iat` on issue
    pub nbf: i64,
    pub iss: String,
    pub kind: TokenKind,
}
