//! `AuthTenant`: an axum extractor resolving the `Authorization: Bearer <token>`
//! header to a `TenantId` via the injected `TokenResolver`, so route handlers
//! never touch the header directly.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::header::AUTHORIZATION;
use igni_core::ApiError;

use crate::state::ServerState;

pub struct AuthTenant(pub igni_core::TenantId);

impl FromRequestParts<ServerState> for AuthTenant {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ServerState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;
        let tenant = (state.token_resolver)(token).ok_or(ApiError::Unauthorized)?;
        Ok(AuthTenant(tenant))
    }
}
