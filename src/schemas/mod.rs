use std::collections::HashMap;

use serde::Serialize;

pub(crate) mod auth;
pub(crate) mod submission;
pub(crate) mod task;
pub(crate) mod user;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
    pub(crate) api_prefix: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct MessageResponse {
    pub(crate) message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Trims every free-text field in place before validation.
pub(crate) trait Normalize {
    fn normalize(&mut self);
}

pub(crate) fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

pub(crate) fn trim_optional(value: &mut Option<String>) {
    if let Some(inner) = value.as_mut() {
        trim_in_place(inner);
    }
}

pub(crate) fn normalize_email(value: &mut String) {
    *value = value.trim().to_lowercase();
}
