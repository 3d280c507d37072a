//! Router-level tests against an in-memory store.

use std::sync::Arc;

use axum::{
  Router,
  body::{Body, to_bytes},
  http::{Method, Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;
use wisdom_core::{engine::FulfillmentEngine, memory::MemoryStore};

fn app() -> Router {
  wisdom_api::api_router(FulfillmentEngine::new(Arc::new(MemoryStore::new())))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let request = Request::builder().method(method).uri(uri);
  let request = match body {
    Some(b) => request
      .header("content-type", "application/json")
      .body(Body::from(b.to_string()))
      .unwrap(),
    None => request.body(Body::empty()).unwrap(),
  };

  let response = app.clone().oneshot(request).await.unwrap();
  let status = response.status();
  let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn create_area(app: &Router, code: &str, weight: f64) -> Uuid {
  let (status, body) = send(
    app,
    Method::POST,
    "/areas",
    Some(json!({ "code": code, "name": code, "default_weight": weight })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  body["area_id"].as_str().unwrap().parse().unwrap()
}

// ─── Areas ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_list_areas() {
  let app = app();
  create_area(&app, "work", 10.0).await;
  create_area(&app, "health", 20.0).await;

  let user = Uuid::new_v4();
  let (status, body) = send(&app, Method::GET, &format!("/areas?user_id={user}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn dimensions_of_unknown_area_are_404() {
  let app = app();
  let (status, body) = send(
    &app,
    Method::GET,
    &format!("/areas/{}/dimensions", Uuid::new_v4()),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("area"));
}

#[tokio::test]
async fn negative_weight_is_400() {
  let app = app();
  let area = create_area(&app, "health", 20.0).await;
  let (status, _) = send(
    &app,
    Method::PUT,
    &format!("/areas/{area}/weight"),
    Some(json!({ "user_id": Uuid::new_v4(), "weight": -3.0 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn weight_set_then_cleared() {
  let app = app();
  let area = create_area(&app, "health", 20.0).await;
  let user = Uuid::new_v4();

  let (status, body) = send(
    &app,
    Method::PUT,
    &format!("/areas/{area}/weight"),
    Some(json!({ "user_id": user, "weight": 45.0 })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["weight"], 45.0);

  let uri = format!("/areas/{area}/weight?user_id={user}");
  assert_eq!(send(&app, Method::DELETE, &uri, None).await.0, StatusCode::NO_CONTENT);
  assert_eq!(send(&app, Method::DELETE, &uri, None).await.0, StatusCode::NOT_FOUND);
}

// ─── Signals ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn out_of_range_score_is_400() {
  let app = app();
  let area = create_area(&app, "health", 20.0).await;
  let (status, body) = send(
    &app,
    Method::POST,
    "/scores",
    Some(json!({ "user_id": Uuid::new_v4(), "area_id": area, "score": 7.5 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("7.5"));
}

#[tokio::test]
async fn score_for_unknown_area_is_404() {
  let app = app();
  let (status, body) = send(
    &app,
    Method::POST,
    "/scores",
    Some(json!({ "user_id": Uuid::new_v4(), "area_id": Uuid::new_v4(), "score": 3.0 })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("area not found"));

  let (status, _) = send(
    &app,
    Method::POST,
    "/entry-links",
    Some(json!({
      "user_id": Uuid::new_v4(),
      "entry_id": Uuid::new_v4(),
      "area_id": Uuid::new_v4(),
      "strength": 0.5,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn score_with_another_areas_dimension_is_404() {
  let app = app();
  let health = create_area(&app, "health", 20.0).await;
  let work = create_area(&app, "work", 10.0).await;
  let (status, dim) = send(
    &app,
    Method::POST,
    &format!("/areas/{work}/dimensions"),
    Some(json!({ "code": "focus", "name": "Focus", "weight_default": 1.0 })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let dimension = dim["dimension_id"].clone();

  let user = Uuid::new_v4();
  let (status, body) = send(
    &app,
    Method::POST,
    "/scores",
    Some(json!({ "user_id": user, "area_id": health, "dimension_id": dimension, "score": 3.0 })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("dimension not found"));

  let (status, _) = send(
    &app,
    Method::POST,
    "/scores",
    Some(json!({ "user_id": user, "area_id": work, "dimension_id": dimension, "score": 3.0 })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn private_area_rollup_is_404_for_strangers() {
  let app = app();
  let owner = Uuid::new_v4();
  let (status, area) = send(
    &app,
    Method::POST,
    "/areas",
    Some(json!({ "code": "craft", "name": "Craft", "default_weight": 5.0, "owner_id": owner })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let area = area["area_id"].as_str().unwrap().to_owned();

  let uri = |user: Uuid| format!("/areas/{area}/rollup?user_id={user}&period=2025-03");
  assert_eq!(send(&app, Method::GET, &uri(owner), None).await.0, StatusCode::OK);
  assert_eq!(send(&app, Method::GET, &uri(Uuid::new_v4()), None).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn area_rollup_reports_strategy() {
  let app = app();
  let area = create_area(&app, "health", 20.0).await;
  let user = Uuid::new_v4();

  let (status, _) = send(
    &app,
    Method::POST,
    "/entry-links",
    Some(json!({
      "user_id": user,
      "entry_id": Uuid::new_v4(),
      "area_id": area,
      "strength": 0.5,
      "recorded_at": "2025-03-10T12:00:00Z",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, body) = send(
    &app,
    Method::GET,
    &format!("/areas/{area}/rollup?user_id={user}&period=2025-03"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["strategy"], "entry_links");
  assert_eq!(body["no_data"], false);
}

// ─── Rituals ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ritual_sessions_drive_impact() {
  let app = app();
  let area = create_area(&app, "health", 20.0).await;
  let user = Uuid::new_v4();

  let (status, ritual) = send(
    &app,
    Method::POST,
    "/rituals",
    Some(json!({ "user_id": user, "name": "Run", "cadence": "weekly", "area_ids": [area] })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let ritual_id = ritual["ritual_id"].as_str().unwrap().to_owned();

  for day in ["03", "10", "17", "24"] {
    let (status, session) = send(
      &app,
      Method::POST,
      &format!("/rituals/{ritual_id}/sessions"),
      Some(json!({ "completed_at": format!("2025-03-{day}T07:00:00Z"), "quality": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["user_id"], json!(user));
  }

  let (status, report) = send(
    &app,
    Method::GET,
    &format!("/rituals/impact?user_id={user}&period=2025-03"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["total_sessions"], 4);
  assert_eq!(report["impacts"][0]["area_id"], json!(area));
}

#[tokio::test]
async fn session_for_unknown_ritual_is_404() {
  let app = app();
  let (status, _) = send(
    &app,
    Method::POST,
    &format!("/rituals/{}/sessions", Uuid::new_v4()),
    Some(json!({})),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deactivated_ritual_leaves_the_list() {
  let app = app();
  let user = Uuid::new_v4();
  let (_, ritual) = send(
    &app,
    Method::POST,
    "/rituals",
    Some(json!({ "user_id": user, "name": "Meditate", "cadence": "daily" })),
  )
  .await;
  let ritual_id = ritual["ritual_id"].as_str().unwrap().to_owned();

  let (status, body) =
    send(&app, Method::POST, &format!("/rituals/{ritual_id}/deactivate"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["active"], false);

  let (_, list) = send(&app, Method::GET, &format!("/rituals?user_id={user}"), None).await;
  assert!(list.as_array().unwrap().is_empty());
}

// ─── Rollups ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn rollup_run_read_and_delete() {
  let app = app();
  let area = create_area(&app, "health", 20.0).await;
  let user = Uuid::new_v4();

  send(
    &app,
    Method::POST,
    "/scores",
    Some(json!({
      "user_id": user,
      "area_id": area,
      "score": 4.0,
      "recorded_at": "2025-03-05T08:00:00Z",
    })),
  )
  .await;

  let (status, report) = send(
    &app,
    Method::POST,
    "/rollups",
    Some(json!({ "user_id": user, "period": "2025-03" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["gfs"], 80.0);
  assert_eq!(report["confidence"], 1.0);

  let uri = format!("/rollups/{user}/2025-03");
  let (status, cached) = send(&app, Method::GET, &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(cached, report);

  assert_eq!(send(&app, Method::DELETE, &uri, None).await.0, StatusCode::NO_CONTENT);
  assert_eq!(send(&app, Method::GET, &uri, None).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_period_is_400() {
  let app = app();
  let user = Uuid::new_v4();

  let (status, _) = send(
    &app,
    Method::POST,
    "/rollups",
    Some(json!({ "user_id": user, "period": "2025-13" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(
    &app,
    Method::POST,
    "/rollups",
    Some(json!({ "user_id": user, "period": "2025-03", "period_type": "quarterly" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(&app, Method::GET, &format!("/rollups/{user}/soon"), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}
