use time::macros::date;
use uuid::Uuid;

use crate::core::config::Settings;
use crate::core::security;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories::users::{CreateUser, UpdateUser};
use crate::repositories::UserRepository;

/// Creates or repairs the administrator named by `BOOTSTRAP_ADMIN_EMAIL`.
pub(crate) async fn ensure_bootstrap_admin<S>(store: &S, settings: &Settings) -> anyhow::Result<()>
where
    S: UserRepository + ?Sized,
{
    let admin = settings.admin();
    let Some(email) = admin.bootstrap_email.as_deref().map(|email| email.trim().to_lowercase()) else {
        return Ok(());
    };
    if admin.bootstrap_password.is_empty() {
        tracing::warn!("BOOTSTRAP_ADMIN_PASSWORD not configured; skipping admin bootstrap");
        return Ok(());
    }

    if let Some(user) = store.find_user_by_email(&email).await? {
        let verified =
            security::verify_password(&admin.bootstrap_password, &user.hashed_password).unwrap_or(false);

        if verified && user.is_admin() {
            tracing::info!("Bootstrap admin already up to date");
            return Ok(());
        }

        let hashed_password = if verified {
            None
        } else {
            Some(security::hash_password(&admin.bootstrap_password)?)
        };

        store
            .update_user(
                &user.id,
                UpdateUser {
                    name: None,
                    email: None,
                    mobile_number: None,
                    date_of_birth: None,
                    role: Some(UserRole::Admin),
                    hashed_password,
                    updated_at: primitive_now_utc(),
                },
            )
            .await?;

        tracing::info!(email = %email, "Updated bootstrap admin");
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.bootstrap_password)?;
    store
        .create_user(CreateUser {
            id: &Uuid::new_v4().to_string(),
            name: &admin.bootstrap_name,
            email: &email,
            mobile_number: "",
            date_of_birth: date!(1970 - 01 - 01),
            role: UserRole::Admin,
            hashed_password,
            created_at: primitive_now_utc(),
        })
        .await?;

    tracing::info!(email = %email, "Created bootstrap admin");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::memory::MemoryStore;
    use crate::test_support;

    fn bootstrap_settings(email: Option<&str>, password: &str) -> Settings {
        test_support::set_test_env();
        if let Some(email) = email {
            std::env::set_var("BOOTSTRAP_ADMIN_EMAIL", email);
        }
        std::env::set_var("BOOTSTRAP_ADMIN_PASSWORD", password);
        let settings = Settings::load().expect("settings");
        std::env::remove_var("BOOTSTRAP_ADMIN_EMAIL");
        std::env::remove_var("BOOTSTRAP_ADMIN_PASSWORD");
        settings
    }

    #[tokio::test]
    async fn creates_missing_admin() {
        let _guard = test_support::env_lock().await;
        let settings = bootstrap_settings(Some("Root@Example.com"), "root-pass");
        let store = MemoryStore::default();

        ensure_bootstrap_admin(&store, &settings).await.expect("bootstrap");

        let admin = store.find_user_by_email("root@example.com").await.unwrap().expect("admin");
        assert!(admin.is_admin());
        assert_eq!(admin.name, "Administrator");
        assert!(security::verify_password("root-pass", &admin.hashed_password).unwrap());
    }

    #[tokio::test]
    async fn promotes_existing_user_and_resets_password() {
        let _guard = test_support::env_lock().await;
        let settings = bootstrap_settings(Some("root@example.com"), "root-pass");
        let store = MemoryStore::default();
        let existing = test_support::insert_user(&store, "root@example.com", "Root").await;

        ensure_bootstrap_admin(&store, &settings).await.expect("bootstrap");

        let admin = store.find_user_by_id(&existing.id).await.unwrap().expect("admin");
        assert!(admin.is_admin());
        assert_eq!(admin.name, "Root");
        assert!(security::verify_password("root-pass", &admin.hashed_password).unwrap());
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn skips_without_email_or_password() {
        let _guard = test_support::env_lock().await;
        let store = MemoryStore::default();

        ensure_bootstrap_admin(&store, &bootstrap_settings(None, "root-pass")).await.expect("no email");
        ensure_bootstrap_admin(&store, &bootstrap_settings(Some("root@example.com"), ""))
            .await
            .expect("no password");

        assert!(store.list_users().await.unwrap().is_empty());
    }
}
