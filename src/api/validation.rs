use heck::ToLowerCamelCase;
use serde::Serialize;
use serde_json::{Map, Value};
use validator::Validate;

use crate::api::errors::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct FieldError {
    pub(crate) field: String,
    pub(crate) message: String,
}

impl FieldError {
    pub(crate) fn new(field: &str, message: impl Into<String>) -> Self {
        Self { field: field.to_string(), message: message.into() }
    }
}

/// Accumulates field errors so one response reports every bad field.
#[derive(Debug, Default)]
pub(crate) struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Starts from the derive-based checks; field names come back in camelCase.
    pub(crate) fn validate<T: Validate>(payload: &T) -> Self {
        let mut collected = Self::default();
        let Err(errors) = payload.validate() else {
            return collected;
        };

        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|(left, _), (right, _)| left.to_string().cmp(&right.to_string()));

        for (field, failures) in fields {
            let field = field.to_lower_camel_case();
            for failure in failures.iter() {
                let message = failure
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {field}"));
                collected.push(&field, message);
            }
        }
        collected
    }

    pub(crate) fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub(crate) fn into_result(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.0))
        }
    }
}

/// Flags every key outside an update allow-list.
pub(crate) fn reject_unknown_fields(extra: &Map<String, Value>, errors: &mut FieldErrors) {
    for key in extra.keys() {
        errors.push(key, format!("Field '{key}' cannot be updated"));
    }
}

/// Reads a JSON array of user ids. Blank entries are dropped and repeats
/// collapsed; anything other than an array of strings is `None`.
pub(crate) fn parse_id_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    let mut ids: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let id = item.as_str()?.trim();
        if !id.is_empty() && !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
    }
    Some(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "Short description is required"))]
        short_description: String,
        #[validate(length(min = 6))]
        password: String,
    }

    #[test]
    fn derive_errors_use_camel_case_fields() {
        let sample = Sample { short_description: String::new(), password: "abc".to_string() };
        let Err(ApiError::Validation(errors)) = FieldErrors::validate(&sample).into_result() else {
            panic!("expected validation errors");
        };

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "password");
        assert_eq!(errors[0].message, "Invalid value for password");
        assert_eq!(errors[1], FieldError::new("shortDescription", "Short description is required"));
    }

    #[derive(Validate)]
    struct Profile {
        #[validate(length(min = 1, message = "Mobile number is required"))]
        mobile_number: String,
        #[validate(length(min = 1, message = "Date of birth is required"))]
        date_of_birth: String,
    }

    #[test]
    fn multi_word_fields_are_reported_in_camel_case() {
        let profile = Profile { mobile_number: String::new(), date_of_birth: String::new() };
        let Err(ApiError::Validation(errors)) = FieldErrors::validate(&profile).into_result() else {
            panic!("expected validation errors");
        };

        let fields: Vec<&str> = errors.iter().map(|error| error.field.as_str()).collect();
        assert_eq!(fields, vec!["dateOfBirth", "mobileNumber"]);
    }

    #[test]
    fn id_list_must_be_array_of_strings() {
        assert_eq!(parse_id_list(&json!(["a", " b ", "a", ""])), Some(vec!["a".into(), "b".into()]));
        assert_eq!(parse_id_list(&json!([])), Some(Vec::new()));
        assert_eq!(parse_id_list(&json!("a")), None);
        assert_eq!(parse_id_list(&json!([1, 2])), None);
    }

    #[test]
    fn unknown_fields_are_each_reported() {
        let extra = json!({ "status": "completed", "createdBy": "x" });
        let mut errors = FieldErrors::default();
        reject_unknown_fields(extra.as_object().unwrap(), &mut errors);

        let Err(ApiError::Validation(errors)) = errors.into_result() else {
            panic!("expected validation errors");
        };
        let fields: Vec<_> = errors.iter().map(|error| error.field.as_str()).collect();
        assert!(fields.contains(&"status"));
        assert!(fields.contains(&"createdBy"));
    }
}
