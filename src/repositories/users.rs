use async_trait::async_trait;
use time::{Date, PrimitiveDateTime};

use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories::StoreError;

pub(crate) struct CreateUser<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) email: &'a str,
    pub(crate) mobile_number: &'a str,
    pub(crate) date_of_birth: Date,
    pub(crate) role: UserRole,
    pub(crate) hashed_password: String,
    pub(crate) created_at: PrimitiveDateTime,
}

/// Column-wise patch; `None` keeps the stored value.
pub(crate) struct UpdateUser {
    pub(crate) name: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) mobile_number: Option<String>,
    pub(crate) date_of_birth: Option<Date>,
    pub(crate) role: Option<UserRole>,
    pub(crate) hashed_password: Option<String>,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[async_trait]
pub(crate) trait UserRepository: Send + Sync {
    /// Fails with [`StoreError::DuplicateEmail`] when the email is taken.
    async fn create_user(&self, params: CreateUser<'_>) -> Result<User, StoreError>;

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Unknown ids are skipped, so the result may be shorter than `ids`.
    async fn find_users_by_ids(&self, ids: &[String]) -> Result<Vec<User>, StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Returns `None` when no user has this id.
    async fn update_user(&self, id: &str, params: UpdateUser) -> Result<Option<User>, StoreError>;

    /// Hard delete. Tasks keep whatever references they hold.
    async fn delete_user(&self, id: &str) -> Result<bool, StoreError>;
}
