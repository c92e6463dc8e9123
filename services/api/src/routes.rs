use crate::infra::{AppState, QuestionnaireService};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use gut_catcher::workflows::questionnaire::submissions::questionnaire_router;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;

/// Questionnaire API plus operational endpoints; anything else is served from `public_dir`.
pub(crate) fn with_questionnaire_routes(
    service: Arc<QuestionnaireService>,
    public_dir: &Path,
) -> axum::Router {
    questionnaire_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .fallback_service(ServeDir::new(public_dir))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{open_store, questionnaire_service};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use gut_catcher::config::NotificationConfig;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    struct Harness {
        _data: tempfile::TempDir,
        _public: tempfile::TempDir,
        router: axum::Router,
        readiness: Arc<AtomicBool>,
    }

    fn harness() -> Harness {
        let data = tempfile::tempdir().expect("data dir");
        let public = tempfile::tempdir().expect("public dir");
        std::fs::write(public.path().join("index.html"), "<h1>Gut Catcher</h1>")
            .expect("write index");

        let store = open_store(data.path()).expect("store opens");
        let service = Arc::new(questionnaire_service(store, NotificationConfig::default()));
        let readiness = Arc::new(AtomicBool::new(false));
        let state = AppState {
            readiness: readiness.clone(),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };

        let router = with_questionnaire_routes(service, public.path()).layer(Extension(state));
        Harness {
            _data: data,
            _public: public,
            router,
            readiness,
        }
    }

    async fn get(router: &axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let harness = harness();
        let (status, body) = get(&harness.router, "/health").await;

        assert_eq!(status, StatusCode::OK);
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn readiness_flips_once_bound() {
        let harness = harness();
        let (status, _) = get(&harness.router, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        harness.readiness.store(true, Ordering::Release);
        let (status, body) = get(&harness.router, "/ready").await;
        assert_eq!(status, StatusCode::OK);
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload["status"], "ready");
    }

    #[tokio::test]
    async fn questions_are_served_from_the_seeded_store() {
        let harness = harness();
        let (status, body) = get(&harness.router, "/api/questions").await;

        assert_eq!(status, StatusCode::OK);
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload[0]["id"], "foundations");
        assert_eq!(payload[1]["items"][0]["caseStudy"]["type"], "image");
    }

    #[tokio::test]
    async fn unknown_paths_fall_through_to_static_files() {
        let harness = harness();

        let (status, body) = get(&harness.router, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<h1>Gut Catcher</h1>");

        let (status, _) = get(&harness.router, "/missing.css").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
