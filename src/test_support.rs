use std::sync::{Arc, OnceLock};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    response::Response,
    Router,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::api;
use crate::core::{config::Settings, security, state::AppState, time::primitive_now_utc};
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories::memory::MemoryStore;
use crate::repositories::users::CreateUser;
use crate::repositories::UserRepository;
use crate::services::storage::UploadStorage;

pub(crate) const TEST_SECRET_KEY: &str = "test-secret";
pub(crate) const TEST_PASSWORD: &str = "password1";

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) uploads_dir: tempfile::TempDir,
    _guard: OwnedMutexGuard<()>,
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env() {
    std::env::set_var("TASKDESK_ENV", "test");
    std::env::set_var("TASKDESK_STRICT_CONFIG", "0");
    std::env::set_var("TASKDESK_STORE", "memory");
    std::env::set_var("SECRET_KEY", TEST_SECRET_KEY);
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    for key in [
        "TASKDESK_HOST",
        "TASKDESK_PORT",
        "API_PREFIX",
        "PROJECT_NAME",
        "ACCESS_TOKEN_EXPIRE_MINUTES",
        "ALGORITHM",
        "ADMIN_ENROLLMENT_CODE",
        "UPLOAD_DIR",
        "MAX_UPLOAD_SIZE_MB",
        "UPLOAD_REQUIRE_AUTH",
        "BOOTSTRAP_ADMIN_EMAIL",
        "BOOTSTRAP_ADMIN_PASSWORD",
        "BOOTSTRAP_ADMIN_NAME",
    ] {
        std::env::remove_var(key);
    }
}

/// Settings from the test environment. Callers hold [`env_lock`].
pub(crate) fn test_settings() -> Settings {
    set_test_env();
    Settings::load().expect("settings")
}

pub(crate) async fn setup_test_context() -> TestContext {
    setup_test_context_with(|| {}).await
}

/// Like [`setup_test_context`], with `configure` run after the defaults so it
/// can override environment variables.
pub(crate) async fn setup_test_context_with(configure: impl FnOnce()) -> TestContext {
    let guard = env_lock().await;
    set_test_env();
    configure();

    let settings = Settings::load().expect("settings");
    let uploads_dir = tempfile::tempdir().expect("upload dir");
    let uploads = UploadStorage::new(
        uploads_dir.path().to_path_buf(),
        settings.storage().max_upload_size_mb * 1024 * 1024,
    );
    let store = Arc::new(MemoryStore::default());

    let state = AppState::new(settings, store.clone(), uploads);
    let app = api::router::router(state.clone());

    TestContext { state, app, store, uploads_dir, _guard: guard }
}

pub(crate) async fn insert_user(store: &MemoryStore, email: &str, name: &str) -> User {
    insert_user_with_role(store, email, name, UserRole::Student).await
}

pub(crate) async fn insert_admin(store: &MemoryStore, email: &str, name: &str) -> User {
    insert_user_with_role(store, email, name, UserRole::Admin).await
}

pub(crate) async fn insert_user_with_role(
    store: &MemoryStore,
    email: &str,
    name: &str,
    role: UserRole,
) -> User {
    let hashed_password = security::hash_password(TEST_PASSWORD).expect("hash password");

    store
        .create_user(CreateUser {
            id: &Uuid::new_v4().to_string(),
            name,
            email,
            mobile_number: "+15550001111",
            date_of_birth: time::macros::date!(2000 - 01 - 15),
            role,
            hashed_password,
            created_at: primitive_now_utc(),
        })
        .await
        .expect("insert user")
}

pub(crate) fn bearer_token(user_id: &str, settings: &Settings) -> String {
    security::create_access_token(user_id, settings).expect("token")
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub(crate) async fn read_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    if bytes.is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_slice(&bytes).expect("json body")
}
