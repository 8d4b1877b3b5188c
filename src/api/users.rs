use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::extract::JsonBody;
use crate::api::guards::CurrentAdmin;
use crate::api::validation::{reject_unknown_fields, FieldErrors};
use crate::core::state::AppState;
use crate::core::time::parse_date;
use crate::db::types::UserRole;
use crate::schemas::user::{UserResponse, UserSummary, UserUpdateRequest};
use crate::schemas::{MessageResponse, Normalize};
use crate::services::credentials::{self, ProfileChanges};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/:user_id", put(update_user).delete(delete_user))
}

async fn list_users(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state
        .store()
        .list_users()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    Ok(Json(users.into_iter().map(UserResponse::from_db).collect()))
}

async fn update_user(
    Path(user_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    JsonBody(mut payload): JsonBody<UserUpdateRequest>,
) -> Result<Json<UserSummary>, ApiError> {
    payload.normalize();

    let mut errors = FieldErrors::validate(&payload);
    reject_unknown_fields(&payload.extra, &mut errors);

    let date_of_birth = match payload.date_of_birth.as_deref() {
        Some(raw) => {
            let parsed = parse_date(raw);
            if parsed.is_none() {
                errors.push("dateOfBirth", "Please enter a valid date");
            }
            parsed
        }
        None => None,
    };
    let role = match payload.role.as_deref() {
        Some(raw) => {
            let parsed = UserRole::parse(raw);
            if parsed.is_none() {
                errors.push("role", "Invalid role");
            }
            parsed
        }
        None => None,
    };
    errors.into_result()?;

    let changes = ProfileChanges {
        name: payload.name,
        email: payload.email,
        mobile_number: payload.mobile_number,
        date_of_birth,
        role,
        password: payload.password,
    };
    let password_changed = changes.password.is_some();

    let user = credentials::update_profile(state.store(), &user_id, changes).await?;

    tracing::info!(
        admin_id = %admin.id,
        user_id = %user.id,
        password_changed,
        action = "user_update",
        "Admin updated user"
    );

    Ok(Json(UserSummary::from_db(&user)))
}

async fn delete_user(
    Path(user_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    credentials::remove(state.store(), &user_id).await?;

    tracing::info!(
        admin_id = %admin.id,
        user_id = %user_id,
        action = "user_delete",
        "Admin deleted user"
    );

    Ok(Json(MessageResponse::new("User deleted successfully")))
}
