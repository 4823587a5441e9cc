#![cfg(feature = "http_api")]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use site_schedule::{
    InMemoryScheduleStore, Item, ItemKind, ItemStatus, Milestone, PermissionSnapshot,
    ResolvedMilestone, ScheduleSummary, http_api,
};
use tower::util::ServiceExt;

fn seeded_backend() -> Arc<InMemoryScheduleStore> {
    let store = InMemoryScheduleStore::new();
    store.upsert_item(Item::new(1, ItemKind::Task, "Scaffold").with_status(ItemStatus::Done));
    store.upsert_item(Item::new(2, ItemKind::Task, "Brickwork"));
    Arc::new(store)
}

fn router_for(backend: Arc<InMemoryScheduleStore>) -> axum::Router {
    http_api::router(http_api::AppState::new(backend))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = router_for(seeded_backend());
    let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn milestone_lifecycle_via_http_api() {
    let app = router_for(seeded_backend());

    // Create with links
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/projects/1/milestones",
            json!({
                "title": "Brickwork complete",
                "start_date": "2025-05-02",
                "event_type": "deadline",
                "created_by": "foreman",
                "linked_item_ids": [1, 2]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Milestone = read_json(response).await;
    assert_eq!(created.title, "Brickwork complete");

    // List resolves linked items
    let response = app
        .clone()
        .oneshot(empty_request("GET", "/projects/1/milestones"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed: Vec<ResolvedMilestone> = read_json(response).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].linked_items.len(), 2);
    assert_eq!(listed[0].progress(), 50);

    // Toggle to completed
    let uri = format!("/milestones/{}/status", created.id);
    let response = app
        .clone()
        .oneshot(json_request("PUT", &uri, json!({ "status": "completed" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Milestone = read_json(response).await;
    assert!(updated.is_completed());

    // Clear links
    let uri = format!("/milestones/{}/links", created.id);
    let response = app
        .clone()
        .oneshot(json_request("PUT", &uri, json!({ "item_ids": [] })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let links: Value = read_json(response).await;
    assert_eq!(links["item_ids"], json!([]));

    // Delete
    let uri = format!("/milestones/{}", created.id);
    let response = app
        .clone()
        .oneshot(empty_request("DELETE", &uri))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(empty_request("DELETE", &uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_milestone_is_rejected() {
    let app = router_for(seeded_backend());
    let response = app
        .oneshot(json_request(
            "POST",
            "/projects/1/milestones",
            json!({
                "title": "Roof",
                "start_date": "2025-06-10",
                "end_date": "2025-06-01",
                "created_by": "foreman"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(response).await;
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn read_only_state_forbids_mutations() {
    let state = http_api::AppState::new(seeded_backend())
        .with_permissions(PermissionSnapshot::read_only());
    let app = http_api::router(state);
    let response = app
        .oneshot(json_request(
            "POST",
            "/projects/1/milestones",
            json!({ "title": "Roof", "start_date": "2025-06-10", "created_by": "viewer" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = read_json(response).await;
    assert_eq!(body["message"], "not allowed to create milestones");
}

#[tokio::test]
async fn summary_reflects_project_target_and_visibility() {
    let app = router_for(seeded_backend());

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/projects/1",
            json!({
                "project_name": "Corner Shops",
                "project_description": "Two retail tenancies",
                "target_end_date": "2099-12-31"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut ids = Vec::new();
    for (title, date) in [("Start on site", "2099-01-05"), ("Board meeting", "2099-03-01")] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/projects/1/milestones",
                json!({ "title": title, "start_date": date, "created_by": "pm" }),
            ))
            .await
            .unwrap();
        let created: Milestone = read_json(response).await;
        ids.push(created.id);
    }

    let uri = format!("/milestones/{}/visibility", ids[1]);
    let response = app
        .clone()
        .oneshot(json_request("PUT", &uri, json!({ "level": "management" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/projects/1/summary"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary: ScheduleSummary = read_json(response).await;
    assert_eq!(summary.milestone_count, 2);
    assert_eq!(summary.overall_progress, 0);

    let response = app
        .oneshot(empty_request("GET", "/projects/1/summary?clearance=team"))
        .await
        .unwrap();
    let summary: ScheduleSummary = read_json(response).await;
    assert_eq!(summary.milestone_count, 1);
    assert_eq!(summary.milestones[0].title, "Start on site");
}

#[tokio::test]
async fn unknown_project_is_not_found() {
    let app = router_for(seeded_backend());
    let response = app
        .oneshot(empty_request("GET", "/projects/404"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = read_json(response).await;
    assert_eq!(body["error"], "not_found");
}
