use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::security::{self, TokenError};
use crate::core::state::AppState;
use crate::db::models::User;

pub(crate) struct CurrentUser(pub(crate) User);
pub(crate) struct CurrentAdmin(pub(crate) User);

/// Caller of the upload route. Required when `UPLOAD_REQUIRE_AUTH` is on,
/// otherwise resolved only if a bearer token is sent.
pub(crate) struct UploadCaller(pub(crate) Option<User>);

fn token_message(err: TokenError) -> &'static str {
    match err {
        TokenError::Missing => "Not authenticated",
        TokenError::Expired => "Token expired",
        TokenError::Malformed => "Invalid authentication credentials",
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, TokenError> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(TokenError::Missing)?;

    let token = value.strip_prefix("Bearer ").ok_or(TokenError::Malformed)?.trim();
    if token.is_empty() {
        return Err(TokenError::Missing);
    }
    Ok(token)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let token = bearer_token(parts).map_err(|err| ApiError::Unauthorized(token_message(err)))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|err| ApiError::Unauthorized(token_message(err)))?;

        let user = app_state
            .store()
            .find_user_by_id(&claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

        let Some(user) = user else {
            return Err(ApiError::Unauthorized("User not found"));
        };

        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.is_admin() {
            Ok(CurrentAdmin(user))
        } else {
            Err(ApiError::Forbidden("Admin access required"))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for UploadCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let required = state.settings().storage().require_upload_auth;
        if !required && !parts.headers.contains_key(header::AUTHORIZATION) {
            return Ok(UploadCaller(None));
        }

        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        Ok(UploadCaller(Some(user)))
    }
}
