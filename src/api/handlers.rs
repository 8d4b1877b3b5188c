use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::collections::HashMap;

use crate::core::metrics;
use crate::core::state::AppState;
use crate::repositories::StoreError;
use crate::schemas::{HealthResponse, RootResponse};

pub(crate) async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    let api = state.settings().api();
    let response = RootResponse {
        message: api.project_name.clone(),
        version: api.version.clone(),
        api_prefix: api.api_prefix.clone(),
    };

    Json(response)
}

pub(crate) async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut status = "healthy".to_string();
    let mut components = HashMap::new();
    let backend = state.store().backend();

    let (store, healthy) = store_component(backend, state.store().ping().await);
    components.insert("store".to_string(), store);
    if !healthy {
        status = "unhealthy".to_string();
    }

    let uploads = if state.uploads().root().is_dir() { "healthy" } else { "missing" };
    if uploads != "healthy" && status == "healthy" {
        status = "degraded".to_string();
    }
    components.insert("uploads".to_string(), uploads.to_string());

    Json(HealthResponse { service: "taskdesk-api".to_string(), status, components })
}

/// Error detail goes to the log only; `/healthz` is public.
fn store_component(backend: &str, ping: Result<(), StoreError>) -> (String, bool) {
    match ping {
        Ok(()) => (format!("{backend}: healthy"), true),
        Err(err) => {
            tracing::error!(error = %err, backend, "Store health check failed");
            (format!("{backend}: unhealthy"), false)
        }
    }
}

pub(crate) async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    if !state.settings().telemetry().prometheus_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    match metrics::render() {
        Some(body) => ([(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
            .into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_store_ping_hides_error_detail() {
        let (component, healthy) =
            store_component("postgres", Err(StoreError::Database(sqlx::Error::PoolTimedOut)));

        assert!(!healthy);
        assert_eq!(component, "postgres: unhealthy");
    }

    #[test]
    fn successful_store_ping_is_healthy() {
        assert_eq!(store_component("memory", Ok(())), ("memory: healthy".to_string(), true));
    }
}
