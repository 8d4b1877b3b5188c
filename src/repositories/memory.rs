use async_trait::async_trait;
use time::PrimitiveDateTime;
use tokio::sync::RwLock;

use crate::db::models::{Task, TaskSubmission, User};
use crate::db::types::TaskStatus;
use crate::repositories::submissions::{CreateSubmission, SubmissionRepository};
use crate::repositories::tasks::{CreateTask, TaskRepository, UpdateTask};
use crate::repositories::users::{CreateUser, UpdateUser, UserRepository};
use crate::repositories::{Store, StoreError};

/// Process-local store. Rows are kept in insertion order so listings match
/// the `ORDER BY created_at` of the Postgres store.
#[derive(Default)]
pub(crate) struct MemoryStore {
    users: RwLock<Vec<User>>,
    tasks: RwLock<Vec<Task>>,
    submissions: RwLock<Vec<TaskSubmission>>,
}

impl MemoryStore {
    #[cfg(test)]
    pub(crate) async fn submissions(&self) -> Vec<TaskSubmission> {
        self.submissions.read().await.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, params: CreateUser<'_>) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|user| user.email == params.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let user = User {
            id: params.id.to_string(),
            name: params.name.to_string(),
            email: params.email.to_string(),
            mobile_number: params.mobile_number.to_string(),
            date_of_birth: params.date_of_birth,
            role: params.role,
            hashed_password: params.hashed_password,
            created_at: params.created_at,
            updated_at: params.created_at,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.iter().find(|user| user.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.iter().find(|user| user.email == email).cloned())
    }

    async fn find_users_by_ids(&self, ids: &[String]) -> Result<Vec<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .filter(|user| ids.contains(&user.id))
            .cloned()
            .collect())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.read().await.clone())
    }

    async fn update_user(&self, id: &str, params: UpdateUser) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;

        if let Some(email) = &params.email {
            if users.iter().any(|user| user.id != id && &user.email == email) {
                return Err(StoreError::DuplicateEmail);
            }
        }

        let Some(user) = users.iter_mut().find(|user| user.id == id) else {
            return Ok(None);
        };

        if let Some(name) = params.name {
            user.name = name;
        }
        if let Some(email) = params.email {
            user.email = email;
        }
        if let Some(mobile_number) = params.mobile_number {
            user.mobile_number = mobile_number;
        }
        if let Some(date_of_birth) = params.date_of_birth {
            user.date_of_birth = date_of_birth;
        }
        if let Some(role) = params.role {
            user.role = role;
        }
        if let Some(hashed_password) = params.hashed_password {
            user.hashed_password = hashed_password;
        }
        user.updated_at = params.updated_at;

        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: &str) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|user| user.id != id);
        Ok(users.len() != before)
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn create_task(&self, params: CreateTask<'_>) -> Result<Task, StoreError> {
        let task = Task {
            id: params.id.to_string(),
            title: params.title.to_string(),
            short_description: params.short_description.to_string(),
            long_description: params.long_description.to_string(),
            deadline: params.deadline,
            assigned_to: params.assigned_to.to_vec(),
            created_by: params.created_by.to_string(),
            status: params.status,
            created_at: params.created_at,
            updated_at: params.created_at,
        };
        self.tasks.write().await.push(task.clone());
        Ok(task)
    }

    async fn find_task_by_id(&self, id: &str) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.read().await.iter().find(|task| task.id == id).cloned())
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.tasks.read().await.clone())
    }

    async fn list_tasks_for_assignee(&self, user_id: &str) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .tasks
            .read()
            .await
            .iter()
            .filter(|task| task.is_assigned_to(user_id))
            .cloned()
            .collect())
    }

    async fn update_task(&self, id: &str, params: UpdateTask) -> Result<Option<Task>, StoreError> {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
            return Ok(None);
        };

        if let Some(title) = params.title {
            task.title = title;
        }
        if let Some(short_description) = params.short_description {
            task.short_description = short_description;
        }
        if let Some(long_description) = params.long_description {
            task.long_description = long_description;
        }
        if let Some(deadline) = params.deadline {
            task.deadline = deadline;
        }
        if let Some(assigned_to) = params.assigned_to {
            task.assigned_to = assigned_to;
        }
        task.updated_at = params.updated_at;

        Ok(Some(task.clone()))
    }

    async fn set_task_status_for_assignee(
        &self,
        task_id: &str,
        assignee_id: &str,
        status: TaskStatus,
        updated_at: PrimitiveDateTime,
    ) -> Result<Option<Task>, StoreError> {
        let mut tasks = self.tasks.write().await;
        let Some(task) =
            tasks.iter_mut().find(|task| task.id == task_id && task.is_assigned_to(assignee_id))
        else {
            return Ok(None);
        };

        task.status = status;
        task.updated_at = updated_at;
        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, id: &str) -> Result<bool, StoreError> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|task| task.id != id);
        Ok(tasks.len() != before)
    }
}

#[async_trait]
impl SubmissionRepository for MemoryStore {
    async fn create_submission(
        &self,
        params: CreateSubmission<'_>,
    ) -> Result<TaskSubmission, StoreError> {
        let submission = TaskSubmission {
            id: params.id.to_string(),
            user_id: params.user_id.to_string(),
            task_id: params.task_id.to_string(),
            status: params.status.to_string(),
            file_original_name: params.file_original_name.to_string(),
            file_stored_name: params.file_stored_name.to_string(),
            created_at: params.created_at,
        };
        self.submissions.write().await.push(submission.clone());
        Ok(submission)
    }
}
