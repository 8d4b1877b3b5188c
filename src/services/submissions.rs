use std::path::Path;

use thiserror::Error;
use uuid::Uuid;

use crate::core::metrics;
use crate::core::time::primitive_now_utc;
use crate::db::models::{TaskSubmission, User};
use crate::repositories::submissions::CreateSubmission;
use crate::repositories::{StoreError, SubmissionRepository, TaskRepository};
use crate::services::storage::{StagedUpload, StorageError, UploadStorage};

const MAX_EXTENSION_LEN: usize = 16;

#[derive(Debug, Error)]
pub(crate) enum SubmissionError {
    #[error("userId is required")]
    MissingUserId,
    #[error("cannot submit work on behalf of another user")]
    Forbidden,
    #[error("task not found")]
    TaskNotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub(crate) struct SubmissionInput {
    pub(crate) user_id: Option<String>,
    pub(crate) task_id: String,
    pub(crate) status: String,
}

/// Who is submitting and whether uploads are gated on authentication.
#[derive(Clone, Copy)]
pub(crate) struct Submitter<'a> {
    pub(crate) caller: Option<&'a User>,
    pub(crate) enforce: bool,
}

/// Stores the upload as `<id><ext>` and records it under that same id.
///
/// The id is chosen before anything is written, so the record is inserted
/// complete. If the insert fails the stored file is deleted again.
pub(crate) async fn submit<S>(
    store: &S,
    uploads: &UploadStorage,
    submitter: Submitter<'_>,
    input: SubmissionInput,
    upload: StagedUpload,
) -> Result<TaskSubmission, SubmissionError>
where
    S: SubmissionRepository + TaskRepository + ?Sized,
{
    let user_id = resolve_user_id(submitter, input.user_id)?;

    if submitter.enforce {
        ensure_task_visible(store, submitter.caller, &input.task_id).await?;
    }

    let id = Uuid::new_v4().to_string();
    let stored_name = stored_file_name(&id, &upload.original_name);
    let original_name = upload.original_name.clone();
    let size = upload.size;

    uploads.commit(upload, &stored_name).await?;

    let created = store
        .create_submission(CreateSubmission {
            id: &id,
            user_id: &user_id,
            task_id: &input.task_id,
            status: &input.status,
            file_original_name: &original_name,
            file_stored_name: &stored_name,
            created_at: primitive_now_utc(),
        })
        .await;

    match created {
        Ok(submission) => {
            metrics::record_submission("stored");
            tracing::info!(
                submission_id = %submission.id,
                user_id = %submission.user_id,
                task_id = %submission.task_id,
                size,
                "Task submission stored"
            );
            Ok(submission)
        }
        Err(err) => {
            metrics::record_submission("failed");
            if let Err(cleanup) = uploads.remove(&stored_name).await {
                tracing::error!(
                    error = %cleanup,
                    stored_name = %stored_name,
                    "Failed to remove file of unrecorded submission"
                );
            }
            Err(err.into())
        }
    }
}

/// Non-admins may only submit against tasks assigned to them; anything else
/// reads as a missing task, as it does for `GET /tasks/:id`.
async fn ensure_task_visible<S>(
    store: &S,
    caller: Option<&User>,
    task_id: &str,
) -> Result<(), SubmissionError>
where
    S: TaskRepository + ?Sized,
{
    let task = store.find_task_by_id(task_id).await?.ok_or(SubmissionError::TaskNotFound)?;

    match caller {
        Some(caller) if !caller.is_admin() && !task.assigned_to.contains(&caller.id) => {
            Err(SubmissionError::TaskNotFound)
        }
        _ => Ok(()),
    }
}

fn resolve_user_id(submitter: Submitter<'_>, requested: Option<String>) -> Result<String, SubmissionError> {
    match (submitter.caller, requested) {
        (None, _) if submitter.enforce => Err(SubmissionError::Forbidden),
        (Some(caller), Some(requested))
            if submitter.enforce && requested != caller.id && !caller.is_admin() =>
        {
            Err(SubmissionError::Forbidden)
        }
        (_, Some(requested)) => Ok(requested),
        (Some(caller), None) => Ok(caller.id.clone()),
        (None, None) => Err(SubmissionError::MissingUserId),
    }
}

/// `<id>` plus the original extension when it is a plain alphanumeric one.
pub(crate) fn stored_file_name(id: &str, original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|ch| ch.is_ascii_alphanumeric())
        });

    match extension {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}
