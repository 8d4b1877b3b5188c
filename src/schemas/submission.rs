use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::TaskSubmission;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmissionResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) task_id: String,
    pub(crate) status: String,
    pub(crate) file_original_name: String,
    pub(crate) file_stored_name: String,
    pub(crate) created_at: String,
}

impl SubmissionResponse {
    pub(crate) fn from_db(submission: TaskSubmission) -> Self {
        Self {
            id: submission.id,
            user_id: submission.user_id,
            task_id: submission.task_id,
            status: submission.status,
            file_original_name: submission.file_original_name,
            file_stored_name: submission.file_stored_name,
            created_at: format_primitive(submission.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitTaskResponse {
    pub(crate) message: String,
    pub(crate) submission: SubmissionResponse,
}
