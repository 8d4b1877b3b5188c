use thiserror::Error;
use time::Date;
use uuid::Uuid;

use crate::core::config::Settings;
use crate::core::security::{self, SecurityError};
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories::users::{CreateUser, UpdateUser};
use crate::repositories::{StoreError, UserRepository};

#[derive(Debug, Error)]
pub(crate) enum CredentialError {
    #[error("user already exists")]
    DuplicateEmail,
    #[error("invalid admin code")]
    InvalidAdminCode,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Security(#[from] SecurityError),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for CredentialError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => Self::DuplicateEmail,
            other => Self::Store(other),
        }
    }
}

pub(crate) struct Registration {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) mobile_number: String,
    pub(crate) date_of_birth: Date,
    pub(crate) role: UserRole,
    pub(crate) password: String,
    pub(crate) admin_code: Option<String>,
}

#[derive(Default)]
pub(crate) struct ProfileChanges {
    pub(crate) name: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) mobile_number: Option<String>,
    pub(crate) date_of_birth: Option<Date>,
    pub(crate) role: Option<UserRole>,
    pub(crate) password: Option<String>,
}

/// Creates an account. Admin accounts need the configured enrollment code.
pub(crate) async fn register<S>(
    store: &S,
    settings: &Settings,
    registration: Registration,
) -> Result<User, CredentialError>
where
    S: UserRepository + ?Sized,
{
    if store.find_user_by_email(&registration.email).await?.is_some() {
        return Err(CredentialError::DuplicateEmail);
    }

    if registration.role == UserRole::Admin
        && registration.admin_code.as_deref() != Some(settings.security().admin_enrollment_code.as_str())
    {
        return Err(CredentialError::InvalidAdminCode);
    }

    let hashed_password = security::hash_password(&registration.password)?;

    // The unique index still guards against a concurrent registration.
    let user = store
        .create_user(CreateUser {
            id: &Uuid::new_v4().to_string(),
            name: &registration.name,
            email: &registration.email,
            mobile_number: &registration.mobile_number,
            date_of_birth: registration.date_of_birth,
            role: registration.role,
            hashed_password,
            created_at: primitive_now_utc(),
        })
        .await?;

    Ok(user)
}

/// Unknown email and wrong password are indistinguishable to the caller.
pub(crate) async fn authenticate<S>(store: &S, email: &str, password: &str) -> Result<User, CredentialError>
where
    S: UserRepository + ?Sized,
{
    let Some(user) = store.find_user_by_email(email).await? else {
        return Err(CredentialError::InvalidCredentials);
    };

    match security::verify_password(password, &user.hashed_password) {
        Ok(true) => Ok(user),
        Ok(false) => Err(CredentialError::InvalidCredentials),
        Err(err) => {
            tracing::warn!(user_id = %user.id, error = %err, "Stored password hash is unreadable");
            Err(CredentialError::InvalidCredentials)
        }
    }
}

pub(crate) async fn update_profile<S>(
    store: &S,
    user_id: &str,
    changes: ProfileChanges,
) -> Result<User, CredentialError>
where
    S: UserRepository + ?Sized,
{
    let hashed_password = match changes.password.as_deref() {
        Some(password) => Some(security::hash_password(password)?),
        None => None,
    };

    store
        .update_user(
            user_id,
            UpdateUser {
                name: changes.name,
                email: changes.email,
                mobile_number: changes.mobile_number,
                date_of_birth: changes.date_of_birth,
                role: changes.role,
                hashed_password,
                updated_at: primitive_now_utc(),
            },
        )
        .await?
        .ok_or(CredentialError::NotFound)
}

pub(crate) async fn remove<S>(store: &S, user_id: &str) -> Result<(), CredentialError>
where
    S: UserRepository + ?Sized,
{
    if store.delete_user(user_id).await? {
        Ok(())
    } else {
        Err(CredentialError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::memory::MemoryStore;
    use crate::test_support;
    use time::macros::date;

    fn registration(email: &str, role: UserRole, admin_code: Option<&str>) -> Registration {
        Registration {
            name: "Ada".to_string(),
            email: email.to_string(),
            mobile_number: "+15550000".to_string(),
            date_of_birth: date!(1999 - 12 - 31),
            role,
            password: "secret1".to_string(),
            admin_code: admin_code.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_without_new_record() {
        let _guard = test_support::env_lock().await;
        let settings = test_support::test_settings();
        let store = MemoryStore::default();

        register(&store, &settings, registration("ada@example.com", UserRole::Student, None))
            .await
            .expect("first registration");
        let err = register(&store, &settings, registration("ada@example.com", UserRole::Student, None))
            .await
            .unwrap_err();

        assert!(matches!(err, CredentialError::DuplicateEmail));
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn admin_registration_requires_enrollment_code() {
        let _guard = test_support::env_lock().await;
        let settings = test_support::test_settings();
        let store = MemoryStore::default();

        let missing = register(&store, &settings, registration("a@example.com", UserRole::Admin, None)).await;
        assert!(matches!(missing, Err(CredentialError::InvalidAdminCode)));

        let wrong =
            register(&store, &settings, registration("a@example.com", UserRole::Admin, Some("NOPE"))).await;
        assert!(matches!(wrong, Err(CredentialError::InvalidAdminCode)));

        let admin = register(&store, &settings, registration("a@example.com", UserRole::Admin, Some("MOD")))
            .await
            .expect("admin");
        assert!(admin.is_admin());
        assert!(admin.hashed_password.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let _guard = test_support::env_lock().await;
        let settings = test_support::test_settings();
        let store = MemoryStore::default();
        register(&store, &settings, registration("ada@example.com", UserRole::Student, None))
            .await
            .expect("register");

        let wrong = authenticate(&store, "ada@example.com", "not-it").await.unwrap_err();
        let unknown = authenticate(&store, "bob@example.com", "secret1").await.unwrap_err();
        assert!(matches!(wrong, CredentialError::InvalidCredentials));
        assert!(matches!(unknown, CredentialError::InvalidCredentials));

        let user = authenticate(&store, "ada@example.com", "secret1").await.expect("login");
        assert_eq!(user.email, "ada@example.com");
    }

    #[tokio::test]
    async fn profile_update_rehashes_password() {
        let _guard = test_support::env_lock().await;
        let settings = test_support::test_settings();
        let store = MemoryStore::default();
        let user = register(&store, &settings, registration("ada@example.com", UserRole::Student, None))
            .await
            .expect("register");

        let changes = ProfileChanges {
            name: Some("Ada L.".to_string()),
            password: Some("another1".to_string()),
            ..ProfileChanges::default()
        };
        let updated = update_profile(&store, &user.id, changes).await.expect("update");

        assert_eq!(updated.name, "Ada L.");
        assert!(authenticate(&store, "ada@example.com", "another1").await.is_ok());
        assert!(authenticate(&store, "ada@example.com", "secret1").await.is_err());

        let missing = update_profile(&store, "ghost", ProfileChanges::default()).await;
        assert!(matches!(missing, Err(CredentialError::NotFound)));
    }

    #[tokio::test]
    async fn remove_reports_missing_user() {
        let _guard = test_support::env_lock().await;
        let settings = test_support::test_settings();
        let store = MemoryStore::default();
        let user = register(&store, &settings, registration("ada@example.com", UserRole::Student, None))
            .await
            .expect("register");

        remove(&store, &user.id).await.expect("remove");
        assert!(matches!(remove(&store, &user.id).await, Err(CredentialError::NotFound)));
    }
}
