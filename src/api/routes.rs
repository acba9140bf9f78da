//! REST routes over the device manager
//!
//! The historical contract: mutating routes answer HTTP 200 even on
//! logical failure, with `errorCode` in the envelope as the
//! authoritative signal. Only the listing route uses HTTP status to
//! report a backend failure.

use crate::api::objects::{
    CreateMappingBody, CreateVolumeBody, Envelope, ResizeVolumeBody, VolumesResponse,
};
use crate::error::RxdError;
use crate::manager::DeviceManager;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use std::sync::Arc;

/// Shared state for all route handlers
#[derive(Clone)]
pub struct RouteState {
    pub manager: Arc<DeviceManager>,
}

/// Build the v1 API router
pub fn router(manager: Arc<DeviceManager>) -> Router {
    Router::new()
        .route(
            "/v1/volumes",
            get(list_volumes).post(create_volume).put(resize_volume),
        )
        .route("/v1/volumes/{id}", delete(remove_volume))
        .route("/v1/cacheStats/{cacheId}", get(cache_stats))
        .route("/v1/cacheMappings", post(create_mapping))
        .route("/v1/cacheMappings/{cacheId}", delete(remove_mapping))
        .with_state(RouteState { manager })
}

fn envelope(result: Result<String, RxdError>) -> Json<Envelope> {
    match result {
        Ok(message) => Json(Envelope::ok(message)),
        Err(err) => Json(Envelope::from_error(&err)),
    }
}

fn rejected(rejection: JsonRejection) -> Json<Envelope> {
    let err = RxdError::invalid_argument(rejection.body_text());
    Json(Envelope::from_error(&err))
}

async fn list_volumes(State(state): State<RouteState>) -> Response {
    match state.manager.list().await {
        Ok(entries) => {
            let volumes = entries.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(VolumesResponse { volumes })).into_response()
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Envelope::from_error(&err)),
        )
            .into_response(),
    }
}

async fn cache_stats(
    State(state): State<RouteState>,
    Path(cache_id): Path<String>,
) -> Json<Envelope> {
    envelope(
        state
            .manager
            .cache_stats(&cache_id)
            .await
            .map(|stats| stats.normalized()),
    )
}

async fn create_volume(
    State(state): State<RouteState>,
    body: Result<Json<CreateVolumeBody>, JsonRejection>,
) -> Json<Envelope> {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection),
    };
    envelope(state.manager.create(body.size).await)
}

async fn resize_volume(
    State(state): State<RouteState>,
    body: Result<Json<ResizeVolumeBody>, JsonRejection>,
) -> Json<Envelope> {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection),
    };
    envelope(state.manager.resize(&body.rapid_disk, body.size).await)
}

async fn remove_volume(
    State(state): State<RouteState>,
    Path(id): Path<String>,
) -> Json<Envelope> {
    envelope(state.manager.remove(&id).await)
}

async fn create_mapping(
    State(state): State<RouteState>,
    body: Result<Json<CreateMappingBody>, JsonRejection>,
) -> Json<Envelope> {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection),
    };
    envelope(
        state
            .manager
            .map_create(&body.rapid_disk, &body.source_drive)
            .await,
    )
}

async fn remove_mapping(
    State(state): State<RouteState>,
    Path(cache_id): Path<String>,
) -> Json<Envelope> {
    envelope(state.manager.map_remove(&cache_id).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utility::invoker::{Invocation, Invoke};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Always answers with the scripted exit code and stdout
    struct FixedInvoker {
        exit_code: i32,
        stdout: Vec<String>,
    }

    #[async_trait]
    impl Invoke for FixedInvoker {
        async fn invoke(
            &self,
            _args: &[String],
            _limit: Duration,
        ) -> Result<Invocation, RxdError> {
            Ok(Invocation {
                exit_code: self.exit_code,
                stdout: self.stdout.clone(),
                stderr: Vec::new(),
            })
        }
    }

    fn state(exit_code: i32, stdout: &[&str]) -> RouteState {
        let invoker = Arc::new(FixedInvoker {
            exit_code,
            stdout: stdout.iter().map(|s| s.to_string()).collect(),
        });
        RouteState {
            manager: Arc::new(DeviceManager::new(invoker, Duration::from_secs(5))),
        }
    }

    #[tokio::test]
    async fn create_volume_success_envelope() {
        let Json(env) = create_volume(
            State(state(0, &["Attached device rxd0 of size 64 Mbytes."])),
            Ok(Json(CreateVolumeBody { size: 64 })),
        )
        .await;

        assert_eq!(env.error_code, 0);
        assert_eq!(env.message, "Attached device rxd0 of size 64 Mbytes.");
    }

    #[tokio::test]
    async fn remove_failure_is_http_200_with_code() {
        let Json(env) = remove_volume(
            State(state(2, &[])),
            Path("rxd9".to_string()),
        )
        .await;

        assert_eq!(env.error_code, 2);
    }

    #[tokio::test]
    async fn remove_invalid_identifier_envelope() {
        let Json(env) = remove_volume(
            State(state(0, &[])),
            Path("sda".to_string()),
        )
        .await;

        assert_eq!(env.error_code, 22);
    }

    #[tokio::test]
    async fn cache_stats_message_is_normalized_line() {
        let Json(env) = cache_stats(
            State(state(
                0,
                &[
                    "stats:",
                    "\treads(10), writes(5)",
                    "\tcache hits(8), cache misses(2)",
                ],
            )),
            Path("rxc0".to_string()),
        )
        .await;

        assert_eq!(env.error_code, 0);
        assert_eq!(env.message, "reads(10) writes(5) cache hits(8) cache misses(2)");
    }

    #[test]
    fn router_builds() {
        let _router = router(Arc::new(DeviceManager::new(
            Arc::new(FixedInvoker {
                exit_code: 0,
                stdout: Vec::new(),
            }),
            Duration::from_secs(5),
        )));
    }
}
