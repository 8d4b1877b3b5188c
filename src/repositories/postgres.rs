use async_trait::async_trait;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Task, TaskSubmission, User};
use crate::db::types::TaskStatus;
use crate::repositories::submissions::{CreateSubmission, SubmissionRepository};
use crate::repositories::tasks::{CreateTask, TaskRepository, UpdateTask};
use crate::repositories::users::{CreateUser, UpdateUser, UserRepository};
use crate::repositories::{Store, StoreError};

const USER_COLUMNS: &str = "\
    id, name, email, mobile_number, date_of_birth, role, hashed_password, \
    created_at, updated_at";

const TASK_COLUMNS: &str = "\
    id, title, short_description, long_description, deadline, assigned_to, \
    created_by, status, created_at, updated_at";

const SUBMISSION_COLUMNS: &str = "\
    id, user_id, task_id, status, file_original_name, file_stored_name, created_at";

#[derive(Clone)]
pub(crate) struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `users.email` is the only unique column besides primary keys.
fn map_write_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::DuplicateEmail,
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, params: CreateUser<'_>) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (
                id, name, email, mobile_number, date_of_birth, role, hashed_password,
                created_at, updated_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
            RETURNING {USER_COLUMNS}",
        ))
        .bind(params.id)
        .bind(params.name)
        .bind(params.email)
        .bind(params.mobile_number)
        .bind(params.date_of_birth)
        .bind(params.role)
        .bind(params.hashed_password)
        .bind(params.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    async fn find_users_by_ids(&self, ids: &[String]) -> Result<Vec<User>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1) ORDER BY created_at, id"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn update_user(&self, id: &str, params: UpdateUser) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET
                name = COALESCE($1, name),
                email = COALESCE($2, email),
                mobile_number = COALESCE($3, mobile_number),
                date_of_birth = COALESCE($4, date_of_birth),
                role = COALESCE($5, role),
                hashed_password = COALESCE($6, hashed_password),
                updated_at = $7
             WHERE id = $8
             RETURNING {USER_COLUMNS}",
        ))
        .bind(params.name)
        .bind(params.email)
        .bind(params.mobile_number)
        .bind(params.date_of_birth)
        .bind(params.role)
        .bind(params.hashed_password)
        .bind(params.updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn delete_user(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TaskRepository for PgStore {
    async fn create_task(&self, params: CreateTask<'_>) -> Result<Task, StoreError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (
                id, title, short_description, long_description, deadline, assigned_to,
                created_by, status, created_at, updated_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$9)
            RETURNING {TASK_COLUMNS}",
        ))
        .bind(params.id)
        .bind(params.title)
        .bind(params.short_description)
        .bind(params.long_description)
        .bind(params.deadline)
        .bind(params.assigned_to)
        .bind(params.created_by)
        .bind(params.status)
        .bind(params.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(task)
    }

    async fn find_task_by_id(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let task = sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    async fn list_tasks_for_assignee(&self, user_id: &str) -> Result<Vec<Task>, StoreError> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE $1 = ANY(assigned_to) ORDER BY created_at, id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    async fn update_task(&self, id: &str, params: UpdateTask) -> Result<Option<Task>, StoreError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET
                title = COALESCE($1, title),
                short_description = COALESCE($2, short_description),
                long_description = COALESCE($3, long_description),
                deadline = COALESCE($4, deadline),
                assigned_to = COALESCE($5, assigned_to),
                updated_at = $6
             WHERE id = $7
             RETURNING {TASK_COLUMNS}",
        ))
        .bind(params.title)
        .bind(params.short_description)
        .bind(params.long_description)
        .bind(params.deadline)
        .bind(params.assigned_to)
        .bind(params.updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn set_task_status_for_assignee(
        &self,
        task_id: &str,
        assignee_id: &str,
        status: TaskStatus,
        updated_at: PrimitiveDateTime,
    ) -> Result<Option<Task>, StoreError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET status = $1, updated_at = $2
             WHERE id = $3 AND $4 = ANY(assigned_to)
             RETURNING {TASK_COLUMNS}",
        ))
        .bind(status)
        .bind(updated_at)
        .bind(task_id)
        .bind(assignee_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn delete_task(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SubmissionRepository for PgStore {
    async fn create_submission(
        &self,
        params: CreateSubmission<'_>,
    ) -> Result<TaskSubmission, StoreError> {
        let submission = sqlx::query_as::<_, TaskSubmission>(&format!(
            "INSERT INTO task_submissions (
                id, user_id, task_id, status, file_original_name, file_stored_name, created_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7)
            RETURNING {SUBMISSION_COLUMNS}",
        ))
        .bind(params.id)
        .bind(params.user_id)
        .bind(params.task_id)
        .bind(params.status)
        .bind(params.file_original_name)
        .bind(params.file_stored_name)
        .bind(params.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(submission)
    }
}
