use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use gatehouse_auth::{TokenCodec, TokenKind};
use gatehouse_core::AppError;
use tracing::warn;

use crate::metrics::track_token_verification;
use crate::state::AppState;

/// The authenticated caller, attached to the request by [`require_auth`].
///
/// Only the user id is trusted for authorization. The username is carried
/// for logging and display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: u64,
    pub username: String,
}

/// Verifies the bearer access token in `headers`.
///
/// Runs before any store access. Every failure is a 401.
pub fn authenticate(headers: &HeaderMap, codec: &TokenCodec) -> Result<Identity, AppError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::unauthorized("authorization token not found"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::unauthorized("auth error 'Bearer {token}'"))?;

    match codec.verify(token, TokenKind::Access) {
        Ok(claims) => {
            track_token_verification("valid");
            Ok(Identity {
                user_id: claims.user_id,
                username: claims.username,
            })
        }
        Err(e) => {
            track_token_verification("invalid");
            warn!(reason = %e, "Rejected bearer token");
            Err(AppError::unauthorized(format!("invalid token: {e}")))
        }
    }
}

/// Middleware that rejects unauthenticated requests and attaches [`Identity`].
///
/// The identity is also copied onto the response so outer layers can log
/// who was served or denied.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = authenticate(req.headers(), &state.tokens)?;
    req.extensions_mut().insert(identity.clone());

    let mut response = next.run(req).await;
    response.extensions_mut().insert(identity);
    Ok(response)
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(identity.clone());
        }
        authenticate(&parts.headers, &state.tokens)
    }
}
