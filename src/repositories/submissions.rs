use async_trait::async_trait;
use time::PrimitiveDateTime;

use crate::db::models::TaskSubmission;
use crate::repositories::StoreError;

pub(crate) struct CreateSubmission<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) task_id: &'a str,
    pub(crate) status: &'a str,
    pub(crate) file_original_name: &'a str,
    pub(crate) file_stored_name: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

#[async_trait]
pub(crate) trait SubmissionRepository: Send + Sync {
    async fn create_submission(
        &self,
        params: CreateSubmission<'_>,
    ) -> Result<TaskSubmission, StoreError>;
}
