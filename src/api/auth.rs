use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::extract::JsonBody;
use crate::api::guards::CurrentUser;
use crate::api::validation::FieldErrors;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::parse_date;
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::schemas::auth::{LoginRequest, RegisterRequest, TokenResponse};
use crate::schemas::user::{UserResponse, UserSummary};
use crate::schemas::Normalize;
use crate::services::credentials::{self, Registration};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

async fn register(
    State(state): State<AppState>,
    JsonBody(mut payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    payload.normalize();

    let mut errors = FieldErrors::validate(&payload);
    let date_of_birth = parse_date(&payload.date_of_birth);
    if date_of_birth.is_none() {
        errors.push("dateOfBirth", "Please enter a valid date");
    }
    let role = UserRole::parse(&payload.role);
    if role.is_none() {
        errors.push("role", "Invalid role");
    }
    errors.into_result()?;

    let (Some(date_of_birth), Some(role)) = (date_of_birth, role) else {
        return Err(ApiError::BadRequest("Invalid registration".to_string()));
    };

    let user = credentials::register(
        state.store(),
        state.settings(),
        Registration {
            name: payload.name,
            email: payload.email,
            mobile_number: payload.mobile_number,
            date_of_birth,
            role,
            password: payload.password,
            admin_code: payload.admin_code,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "User registered");

    let response = token_response(&state, &user)?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login(
    State(state): State<AppState>,
    JsonBody(mut payload): JsonBody<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    payload.normalize();
    FieldErrors::validate(&payload).into_result()?;

    let user = credentials::authenticate(state.store(), &payload.email, &payload.password).await?;

    Ok(Json(token_response(&state, &user)?))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

fn token_response(state: &AppState, user: &User) -> Result<TokenResponse, ApiError> {
    let token = security::create_access_token(&user.id, state.settings())
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(TokenResponse {
        token,
        token_type: "bearer".to_string(),
        user: UserSummary::from_db(user),
    })
}
