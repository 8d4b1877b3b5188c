use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::UploadCaller;
use crate::api::validation::FieldErrors;
use crate::core::state::AppState;
use crate::schemas::submission::{SubmissionResponse, SubmitTaskResponse};
use crate::services::storage::StagedUpload;
use crate::services::submissions::{self, SubmissionInput, Submitter};

/// Room for the non-file form fields and multipart framing.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub(crate) fn router(max_upload_bytes: u64) -> Router<AppState> {
    let body_limit = usize::try_from(max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/submit-task", post(submit_task))
        .layer(DefaultBodyLimit::max(body_limit))
}

#[derive(Default)]
struct SubmissionForm {
    upload: Option<StagedUpload>,
    user_id: Option<String>,
    task_id: Option<String>,
    status: Option<String>,
}

async fn submit_task(
    UploadCaller(caller): UploadCaller,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SubmitTaskResponse>, ApiError> {
    let form = read_form(&state, multipart).await?;

    let mut errors = FieldErrors::default();
    if form.upload.is_none() {
        errors.push("file", "A file is required");
    }
    if form.task_id.is_none() {
        errors.push("taskId", "taskId is required");
    }
    errors.into_result()?;

    let (Some(upload), Some(task_id)) = (form.upload, form.task_id) else {
        return Err(ApiError::BadRequest("Incomplete submission".to_string()));
    };

    let submission = submissions::submit(
        state.store(),
        state.uploads(),
        Submitter {
            caller: caller.as_ref(),
            enforce: state.settings().storage().require_upload_auth,
        },
        SubmissionInput { user_id: form.user_id, task_id, status: form.status.unwrap_or_default() },
        upload,
    )
    .await?;

    Ok(Json(SubmitTaskResponse {
        message: "Task submitted".to_string(),
        submission: SubmissionResponse::from_db(submission),
    }))
}

/// Streams the `file` part to staging and collects the text fields. Any
/// partial file is removed when the form is dropped on error.
async fn read_form(state: &AppState, mut multipart: Multipart) -> Result<SubmissionForm, ApiError> {
    let mut form = SubmissionForm::default();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                if form.upload.is_some() {
                    return Err(ApiError::field("file", "Only one file may be submitted"));
                }
                let original_name = field
                    .file_name()
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .ok_or_else(|| ApiError::field("file", "The file part needs a file name"))?
                    .to_string();

                let mut staging = state.uploads().begin_staging(&original_name).await?;
                while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                    staging.write_chunk(&chunk).await?;
                }
                form.upload = Some(staging.finish().await?);
            }
            "userId" | "user_id" => form.user_id = non_empty(field.text().await.map_err(multipart_error)?),
            "taskId" | "task_id" => form.task_id = non_empty(field.text().await.map_err(multipart_error)?),
            "status" => form.status = Some(field.text().await.map_err(multipart_error)?.trim().to_string()),
            other => tracing::debug!(field = %other, "Ignoring unexpected multipart field"),
        }
    }

    Ok(form)
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
}

#[cfg(test)]
mod tests;
