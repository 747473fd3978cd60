//! Token issuance and verification.
//!
//! [`TokenCodec`] is built once at startup from an injected [`JwtConfig`]
//! and shared by reference. It signs with HMAC-SHA256 only: the `alg` header
//! is pinned before any decoding, so tokens announcing another algorithm
//! (including `none`) are refused as [`TokenError::InvalidSignature`].
//!
//! Expiry is checked with no leeway. A token is rejected from the exact
//! second of its `exp` claim onwards.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Deserialize;

use gatehouse_config::JwtConfig;

use crate::claims::{Claims, TokenKind};
use crate::error::TokenError;

pub struct TokenCodec {
    issuer: String,
    access_ttl: i64,
    refresh_ttl: i64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

impl TokenCodec {
    pub const ALGORITHM: Algorithm = Algorithm::HS256;

    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Self::ALGORITHM);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss"]);
        // exp/nbf are compared against the caller's clock in `verify_at`
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;

        Self {
            issuer: config.issuer.clone(),
            access_ttl: config.access_token_expiry,
            refresh_ttl: config.refresh_token_expiry,
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Access token lifetime in seconds.
    pub fn access_ttl(&self) -> i64 {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> i64 {
        self.refresh_ttl
    }

    pub fn issue_access_token(
        &self,
        user_id: u64,
        username: &str,
        role: &str,
    ) -> Result<String, TokenError> {
        self.issue_at(user_id, username, role, TokenKind::Access, Utc::now().timestamp())
    }

    pub fn issue_refresh_token(
        &self,
        user_id: u64,
        username: &str,
        role: &str,
    ) -> Result<String, TokenError> {
        self.issue_at(user_id, username, role, TokenKind::Refresh, Utc::now().timestamp())
    }

    /// Issues a token as if the clock read `now` (Unix seconds).
    pub fn issue_at(
        &self,
        user_id: u64,
        username: &str,
        role: &str,
        kind: TokenKind,
        now: i64,
    ) -> Result<String, TokenError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            user_id,
            username: username.to_string(),
            role: role.to_string(),
            exp: now + ttl,
            iat: now,
            nbf: now,
            iss: self.issuer.clone(),
            kind,
        };

        encode(&Header::new(Self::ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        self.verify_at(token, expected, Utc::now().timestamp())
    }

    /// Verifies a token as if the clock read `now` (Unix seconds).
    pub fn verify_at(
        &self,
        token: &str,
        expected: TokenKind,
        now: i64,
    ) -> Result<Claims, TokenError> {
        Self::check_algorithm(token)?;

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims;

        if now >= claims.exp {
            return Err(TokenError::Expired);
        }
        if now < claims.nbf {
            return Err(TokenError::NotYetValid);
        }
        if claims.kind != expected {
            return Err(TokenError::WrongKind {
                expected,
                actual: claims.kind,
            });
        }

        Ok(claims)
    }

    /// Rejects any header whose `alg` is not the pinned algorithm.
    fn check_algorithm(token: &str) -> Result<(), TokenError> {
        let mut segments = token.split('.');
        let (Some(header), Some(_), Some(_), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Malformed);
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(header)
            .map_err(|_| TokenError::Malformed)?;
        let header: RawHeader = serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)?;

        if header.alg != "HS256" {
            return Err(TokenError::InvalidSignature);
        }
        Ok(())
    }
}
