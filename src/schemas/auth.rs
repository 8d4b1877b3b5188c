use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::schemas::user::UserSummary;
use crate::schemas::{normalize_email, trim_in_place, trim_optional, Normalize};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub(crate) name: String,
    #[serde(default)]
    #[validate(email(message = "Please enter a valid email"))]
    pub(crate) email: String,
    #[serde(default, alias = "mobile_number")]
    #[validate(length(min = 1, message = "Mobile number is required"))]
    pub(crate) mobile_number: String,
    #[serde(default, alias = "date_of_birth")]
    pub(crate) date_of_birth: String,
    #[serde(default)]
    pub(crate) role: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub(crate) password: String,
    #[serde(default, alias = "admin_code")]
    pub(crate) admin_code: Option<String>,
}

impl Normalize for RegisterRequest {
    fn normalize(&mut self) {
        trim_in_place(&mut self.name);
        normalize_email(&mut self.email);
        trim_in_place(&mut self.mobile_number);
        trim_in_place(&mut self.date_of_birth);
        trim_in_place(&mut self.role);
        trim_optional(&mut self.admin_code);
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "Please enter a valid email"))]
    pub(crate) email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub(crate) password: String,
}

impl Normalize for LoginRequest {
    fn normalize(&mut self) {
        normalize_email(&mut self.email);
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenResponse {
    pub(crate) token: String,
    pub(crate) token_type: String,
    pub(crate) user: UserSummary,
}
