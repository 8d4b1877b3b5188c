//! Persistence seam. Handlers and services only see the [`Store`] trait
//! object held by `AppState`; production wires [`postgres::PgStore`], tests
//! and `TASKDESK_STORE=memory` wire [`memory::MemoryStore`].

pub(crate) mod memory;
pub(crate) mod postgres;
pub(crate) mod submissions;
pub(crate) mod tasks;
pub(crate) mod users;

use async_trait::async_trait;
use thiserror::Error;

pub(crate) use submissions::SubmissionRepository;
pub(crate) use tasks::TaskRepository;
pub(crate) use users::UserRepository;

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("email is already registered")]
    DuplicateEmail,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub(crate) trait Store: UserRepository + TaskRepository + SubmissionRepository {
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> Result<(), StoreError>;
}
