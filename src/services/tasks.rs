use std::collections::HashMap;

use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::{Task, User};
use crate::db::types::TaskStatus;
use crate::repositories::tasks::{CreateTask, UpdateTask};
use crate::repositories::{StoreError, TaskRepository, UserRepository};

#[derive(Debug, Error)]
pub(crate) enum TaskError {
    #[error("task not found")]
    NotFound,
    #[error("admin access required")]
    Forbidden,
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub(crate) struct NewTask {
    pub(crate) title: String,
    pub(crate) short_description: String,
    pub(crate) long_description: String,
    pub(crate) deadline: OffsetDateTime,
    pub(crate) assigned_to: Vec<String>,
}

/// Admin edit. The deadline is always resubmitted.
pub(crate) struct TaskChanges {
    pub(crate) title: Option<String>,
    pub(crate) short_description: Option<String>,
    pub(crate) long_description: Option<String>,
    pub(crate) deadline: OffsetDateTime,
    pub(crate) assigned_to: Option<Vec<String>>,
}

/// A task with its user references resolved. Dangling assignee ids are
/// dropped; a deleted creator leaves `creator` empty.
#[derive(Debug)]
pub(crate) struct PopulatedTask {
    pub(crate) task: Task,
    pub(crate) assignees: Vec<User>,
    pub(crate) creator: Option<User>,
}

fn ensure_admin(actor: &User) -> Result<(), TaskError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(TaskError::Forbidden)
    }
}

pub(crate) async fn create<S>(store: &S, actor: &User, new_task: NewTask) -> Result<Task, TaskError>
where
    S: TaskRepository + ?Sized,
{
    ensure_admin(actor)?;

    let task = store
        .create_task(CreateTask {
            id: &Uuid::new_v4().to_string(),
            title: &new_task.title,
            short_description: &new_task.short_description,
            long_description: &new_task.long_description,
            deadline: new_task.deadline,
            assigned_to: &new_task.assigned_to,
            created_by: &actor.id,
            status: TaskStatus::Pending,
            created_at: primitive_now_utc(),
        })
        .await?;

    Ok(task)
}

/// Admins see every task, everyone else only what they are assigned to.
pub(crate) async fn list_for<S>(store: &S, user: &User) -> Result<Vec<Task>, TaskError>
where
    S: TaskRepository + ?Sized,
{
    let tasks = if user.is_admin() {
        store.list_tasks().await?
    } else {
        store.list_tasks_for_assignee(&user.id).await?
    };
    Ok(tasks)
}

pub(crate) async fn get_for<S>(store: &S, user: &User, task_id: &str) -> Result<Task, TaskError>
where
    S: TaskRepository + ?Sized,
{
    let task = store.find_task_by_id(task_id).await?.ok_or(TaskError::NotFound)?;
    if user.is_admin() || task.is_assigned_to(&user.id) {
        Ok(task)
    } else {
        Err(TaskError::NotFound)
    }
}

/// Only assignees may change the status. Anyone else, admins included, gets
/// `NotFound` so task ids are not disclosed.
pub(crate) async fn set_status<S>(
    store: &S,
    user: &User,
    task_id: &str,
    status: TaskStatus,
) -> Result<Task, TaskError>
where
    S: TaskRepository + ?Sized,
{
    store
        .set_task_status_for_assignee(task_id, &user.id, status, primitive_now_utc())
        .await?
        .ok_or(TaskError::NotFound)
}

pub(crate) async fn update<S>(
    store: &S,
    actor: &User,
    task_id: &str,
    changes: TaskChanges,
) -> Result<Task, TaskError>
where
    S: TaskRepository + ?Sized,
{
    ensure_admin(actor)?;

    store
        .update_task(
            task_id,
            UpdateTask {
                title: changes.title,
                short_description: changes.short_description,
                long_description: changes.long_description,
                deadline: Some(changes.deadline),
                assigned_to: changes.assigned_to,
                updated_at: primitive_now_utc(),
            },
        )
        .await?
        .ok_or(TaskError::NotFound)
}

pub(crate) async fn delete<S>(store: &S, actor: &User, task_id: &str) -> Result<(), TaskError>
where
    S: TaskRepository + ?Sized,
{
    ensure_admin(actor)?;

    if store.delete_task(task_id).await? {
        Ok(())
    } else {
        Err(TaskError::NotFound)
    }
}

/// Resolves creator and assignee ids with a single user lookup.
pub(crate) async fn populate<S>(store: &S, tasks: Vec<Task>) -> Result<Vec<PopulatedTask>, TaskError>
where
    S: UserRepository + ?Sized,
{
    let mut ids: Vec<String> = Vec::new();
    for task in &tasks {
        for id in task.assigned_to.iter().chain(std::iter::once(&task.created_by)) {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
    }

    let users: HashMap<String, User> = store
        .find_users_by_ids(&ids)
        .await?
        .into_iter()
        .map(|user| (user.id.clone(), user))
        .collect();

    Ok(tasks
        .into_iter()
        .map(|task| {
            let assignees =
                task.assigned_to.iter().filter_map(|id| users.get(id).cloned()).collect();
            let creator = users.get(&task.created_by).cloned();
            PopulatedTask { task, assignees, creator }
        })
        .collect())
}
