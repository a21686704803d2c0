//! JWT extractor
//!
//! Protected handlers take [`CurrentUser`] as an argument; extraction
//! validates the bearer token and rejects anything on the logout blacklist.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::db::repository::RevokedTokenRepository;
use crate::utils::AppError;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Already extracted earlier in this request
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = match auth_header {
            Some(header) => JwtService::extract_from_header(header)
                .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
            None => {
                tracing::warn!(target: "security", uri = %parts.uri, "Missing authorization header");
                return Err(AppError::unauthorized());
            }
        };

        let claims = state.jwt_service.validate_token(token).map_err(|e| {
            tracing::warn!(target: "security", error = %e, uri = %parts.uri, "Token validation failed");
            match e {
                JwtError::ExpiredToken => AppError::token_expired(),
                _ => AppError::invalid_token("Invalid token"),
            }
        })?;

        // Logged-out tokens stay invalid until their natural expiry
        let revoked_tokens = RevokedTokenRepository::new(state.db.db.clone());
        if revoked_tokens.is_revoked(token).await? {
            tracing::warn!(target: "security", uri = %parts.uri, "Revoked token presented");
            return Err(AppError::invalid_token("Token has been revoked"));
        }

        let user = CurrentUser::from(claims);
        parts.extensions.insert(user.clone());

        Ok(user)
    }
}
