use sqlx::FromRow;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::db::types::{TaskStatus, UserRole};

#[derive(Debug, Clone, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) mobile_number: String,
    pub(crate) date_of_birth: Date,
    pub(crate) role: UserRole,
    pub(crate) hashed_password: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl User {
    pub(crate) fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Task {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) short_description: String,
    pub(crate) long_description: String,
    pub(crate) deadline: OffsetDateTime,
    pub(crate) assigned_to: Vec<String>,
    pub(crate) created_by: String,
    pub(crate) status: TaskStatus,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl Task {
    pub(crate) fn is_assigned_to(&self, user_id: &str) -> bool {
        self.assigned_to.iter().any(|assignee| assignee == user_id)
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct TaskSubmission {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) task_id: String,
    pub(crate) status: String,
    pub(crate) file_original_name: String,
    pub(crate) file_stored_name: String,
    pub(crate) created_at: PrimitiveDateTime,
}
