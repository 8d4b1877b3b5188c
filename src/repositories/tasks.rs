use async_trait::async_trait;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::db::models::Task;
use crate::db::types::TaskStatus;
use crate::repositories::StoreError;

pub(crate) struct CreateTask<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) short_description: &'a str,
    pub(crate) long_description: &'a str,
    pub(crate) deadline: OffsetDateTime,
    pub(crate) assigned_to: &'a [String],
    pub(crate) created_by: &'a str,
    pub(crate) status: TaskStatus,
    pub(crate) created_at: PrimitiveDateTime,
}

/// Only the admin-editable columns; status and creator are not patchable here.
pub(crate) struct UpdateTask {
    pub(crate) title: Option<String>,
    pub(crate) short_description: Option<String>,
    pub(crate) long_description: Option<String>,
    pub(crate) deadline: Option<OffsetDateTime>,
    pub(crate) assigned_to: Option<Vec<String>>,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[async_trait]
pub(crate) trait TaskRepository: Send + Sync {
    async fn create_task(&self, params: CreateTask<'_>) -> Result<Task, StoreError>;

    async fn find_task_by_id(&self, id: &str) -> Result<Option<Task>, StoreError>;

    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError>;

    async fn list_tasks_for_assignee(&self, user_id: &str) -> Result<Vec<Task>, StoreError>;

    async fn update_task(&self, id: &str, params: UpdateTask) -> Result<Option<Task>, StoreError>;

    /// Sets the status only if `assignee_id` is listed on the task, checking
    /// and writing in one step. `None` covers both a missing task and a
    /// caller who is not an assignee.
    async fn set_task_status_for_assignee(
        &self,
        task_id: &str,
        assignee_id: &str,
        status: TaskStatus,
        updated_at: PrimitiveDateTime,
    ) -> Result<Option<Task>, StoreError>;

    async fn delete_task(&self, id: &str) -> Result<bool, StoreError>;
}
