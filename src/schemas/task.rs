use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::core::time::{format_offset, format_primitive};
use crate::db::models::User;
use crate::db::types::TaskStatus;
use crate::schemas::{trim_in_place, trim_optional, Normalize};
use crate::services::tasks::PopulatedTask;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskCreateRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title is required"))]
    pub(crate) title: String,
    #[serde(default, alias = "short_description")]
    #[validate(length(min = 1, message = "Short description is required"))]
    pub(crate) short_description: String,
    #[serde(default, alias = "long_description")]
    #[validate(length(min = 1, message = "Long description is required"))]
    pub(crate) long_description: String,
    #[serde(default)]
    pub(crate) deadline: Option<String>,
    /// Kept raw so a non-array value becomes a field error, not a parse error.
    #[serde(default, alias = "assigned_to")]
    pub(crate) assigned_to: Option<Value>,
}

impl Normalize for TaskCreateRequest {
    fn normalize(&mut self) {
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.short_description);
        trim_in_place(&mut self.long_description);
        trim_optional(&mut self.deadline);
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskUpdateRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default, alias = "short_description")]
    #[validate(length(min = 1, message = "Short description cannot be empty"))]
    pub(crate) short_description: Option<String>,
    #[serde(default, alias = "long_description")]
    #[validate(length(min = 1, message = "Long description cannot be empty"))]
    pub(crate) long_description: Option<String>,
    #[serde(default)]
    pub(crate) deadline: Option<String>,
    #[serde(default, alias = "assigned_to")]
    pub(crate) assigned_to: Option<Value>,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl Normalize for TaskUpdateRequest {
    fn normalize(&mut self) {
        trim_optional(&mut self.title);
        trim_optional(&mut self.short_description);
        trim_optional(&mut self.long_description);
        trim_optional(&mut self.deadline);
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdateRequest {
    #[serde(default)]
    pub(crate) status: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TaskUserRef {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
}

impl TaskUserRef {
    fn from_db(user: User) -> Self {
        Self { id: user.id, name: user.name, email: user.email }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) short_description: String,
    pub(crate) long_description: String,
    pub(crate) deadline: String,
    pub(crate) assigned_to: Vec<TaskUserRef>,
    pub(crate) created_by: Option<TaskUserRef>,
    pub(crate) status: TaskStatus,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl TaskResponse {
    pub(crate) fn from_populated(populated: PopulatedTask) -> Self {
        let PopulatedTask { task, assignees, creator } = populated;
        Self {
            id: task.id,
            title: task.title,
            short_description: task.short_description,
            long_description: task.long_description,
            deadline: format_offset(task.deadline),
            assigned_to: assignees.into_iter().map(TaskUserRef::from_db).collect(),
            created_by: creator.map(TaskUserRef::from_db),
            status: task.status,
            created_at: format_primitive(task.created_at),
            updated_at: format_primitive(task.updated_at),
        }
    }
}
