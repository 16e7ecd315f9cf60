//! Principal extractor
//!
//! Lets handlers take a [`Principal`] argument directly

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::{JwtService, Principal};
use crate::auth::middleware::principal_from_token;
use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;

impl FromRequestParts<ServerState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Already validated by the middleware
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(principal.clone());
        }

        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = match auth_header {
            Some(header) => JwtService::extract_from_header(header)
                .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
            None => {
                security_log!("WARN", "auth_missing", uri = format!("{:?}", parts.uri));
                return Err(AppError::not_authenticated());
            }
        };

        let principal = principal_from_token(state.get_jwt_service(), token, &parts.uri)?;
        parts.extensions.insert(principal.clone());
        Ok(principal)
    }
}
