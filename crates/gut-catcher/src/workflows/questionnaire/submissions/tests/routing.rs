use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::workflows::questionnaire::storage::QuestionnaireSnapshot;
use crate::workflows::questionnaire::submissions::router::{client_context, submit_handler};
use crate::workflows::questionnaire::submissions::SubmissionService;

use super::common::*;

fn post_submission(body: impl Into<Body>) -> Request<Body> {
    Request::post("/api/submissions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .expect("request builds")
}

#[tokio::test]
async fn questions_route_returns_the_full_catalog() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(Request::get("/api/questions").body(Body::empty()).expect("request"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let ids: Vec<&str> = payload
        .as_array()
        .expect("catalog array")
        .iter()
        .filter_map(|section| section["id"].as_str())
        .collect();
    assert_eq!(ids, ["strategy", "growth", "ops"]);
    assert_eq!(payload[2]["labels"], json!(["enterprise"]));
}

#[tokio::test]
async fn personas_and_scoring_routes_expose_the_registry() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let personas = router
        .clone()
        .oneshot(Request::get("/api/personas").body(Body::empty()).expect("request"))
        .await
        .expect("route executes");
    assert_eq!(personas.status(), StatusCode::OK);
    let personas = read_json_body(personas).await;
    assert_eq!(personas[1], json!({ "id": "marketing", "title": "Marketing Lead" }));

    let scoring = router
        .oneshot(Request::get("/api/scoring").body(Body::empty()).expect("request"))
        .await
        .expect("route executes");
    let scoring = read_json_body(scoring).await;
    assert_eq!(scoring["default"], json!({ "No": 0.0, "Yes": 1.0 }));
    assert_eq!(scoring["marketing"]["Yes"], json!(2.0));
}

#[tokio::test]
async fn submit_route_stores_and_acknowledges() {
    let (service, repository, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(post_submission(
            serde_json::to_vec(&submission_body()).expect("encode"),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await, json!({ "success": true }));

    let records = repository.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].score.persona, "marketing");
}

#[tokio::test]
async fn submit_route_reports_validation_messages() {
    let cases = [
        (json!({ "answers": {} }), "A valid email is required."),
        (
            json!({ "email": "lead@example.com", "answers": "Yes" }),
            "Answers must be an object.",
        ),
        (
            json!({ "email": "lead@example.com", "answers": { "goals": true } }),
            "Answers must map question ids to option strings.",
        ),
    ];

    for (body, message) in cases {
        let (service, repository, _) = build_service();
        let router = router_with_service(service);

        let response = router
            .oneshot(post_submission(serde_json::to_vec(&body).expect("encode")))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json_body(response).await, json!({ "error": message }));
        assert!(repository.records().is_empty());
    }
}

#[tokio::test]
async fn submit_route_treats_garbage_as_missing_email() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(post_submission("email=lead@example.com"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], Value::from("A valid email is required."));
}

#[tokio::test]
async fn submit_handler_returns_internal_error_on_repository_failure() {
    let service = Arc::new(SubmissionService::new(
        Arc::new(snapshot()),
        Arc::new(UnavailableRepository),
        Arc::new(MemoryNotifier::default()),
    ));

    let response = submit_handler::<QuestionnaireSnapshot, UnavailableRepository, MemoryNotifier>(
        State(service),
        None,
        HeaderMap::new(),
        Bytes::from(serde_json::to_vec(&submission_body()).expect("encode")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        read_json_body(response).await,
        json!({ "error": "Failed to save submission." })
    );
}

#[tokio::test]
async fn list_route_returns_stored_submissions() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    service
        .submit(
            crate::workflows::questionnaire::submissions::SubmissionRequest::from_json(
                submission_body(),
            )
            .expect("valid body"),
            Default::default(),
        )
        .expect("stored");

    let router = crate::workflows::questionnaire::submissions::questionnaire_router(service);
    let response = router
        .oneshot(Request::get("/api/submissions").body(Body::empty()).expect("request"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["count"], json!(1));
    assert_eq!(payload["submissions"][0]["email"], json!("lead@example.com"));
    assert!(payload["submissions"][0]["createdAt"].is_string());
    assert_eq!(payload["submissions"][0]["score"]["persona"], json!("marketing"));
}

#[test]
fn client_context_prefers_forwarded_header() {
    let peer: SocketAddr = "10.0.0.5:4410".parse().expect("socket addr");
    let mut headers = HeaderMap::new();
    headers.insert("x-forwarded-for", HeaderValue::from_static("198.51.100.20"));
    headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8.0"));

    let context = client_context(&headers, Some(peer));
    assert_eq!(context.ip.as_deref(), Some("198.51.100.20"));
    assert_eq!(context.user_agent.as_deref(), Some("curl/8.0"));

    let context = client_context(&HeaderMap::new(), Some(peer));
    assert_eq!(context.ip.as_deref(), Some("10.0.0.5"));
    assert_eq!(context.user_agent, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_submissions_are_all_stored() {
    let (service, repository, _) = build_service();
    let router = router_with_service(service);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let router = router.clone();
        handles.push(tokio::spawn(async move {
            router
                .oneshot(post_submission(
                    serde_json::to_vec(&submission_body()).expect("encode"),
                ))
                .await
                .expect("route executes")
                .status()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.expect("task joins"), StatusCode::OK);
    }

    let mut ids: Vec<String> = repository.records().into_iter().map(|r| r.id.0).collect();
    assert_eq!(ids.len(), 8);
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
}
