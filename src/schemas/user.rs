use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::core::time::{format_date, format_primitive};
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::schemas::{normalize_email, trim_optional, Normalize};

/// Full profile, never including the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) mobile_number: String,
    pub(crate) date_of_birth: String,
    pub(crate) role: UserRole,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            mobile_number: user.mobile_number,
            date_of_birth: format_date(user.date_of_birth),
            role: user.role,
            created_at: format_primitive(user.created_at),
            updated_at: format_primitive(user.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct UserSummary {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) role: UserRole,
}

impl UserSummary {
    pub(crate) fn from_db(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserUpdateRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[validate(email(message = "Please enter a valid email"))]
    pub(crate) email: Option<String>,
    #[serde(default, alias = "mobile_number")]
    #[validate(length(min = 1, message = "Mobile number cannot be empty"))]
    pub(crate) mobile_number: Option<String>,
    #[serde(default, alias = "date_of_birth")]
    pub(crate) date_of_birth: Option<String>,
    #[serde(default)]
    pub(crate) role: Option<String>,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub(crate) password: Option<String>,
    /// Anything outside the allow-list; rejected by the handler.
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl Normalize for UserUpdateRequest {
    fn normalize(&mut self) {
        trim_optional(&mut self.name);
        if let Some(email) = self.email.as_mut() {
            normalize_email(email);
        }
        trim_optional(&mut self.mobile_number);
        trim_optional(&mut self.date_of_birth);
        trim_optional(&mut self.role);
    }
}
