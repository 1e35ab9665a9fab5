mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

fn seed() -> Value {
    json!({
        "users": [
            {"id": 1, "email": "dev@example.com", "password": "x", "fullName": "Ada Deploy", "updatedAt": 0},
        ],
        "companies": [
            {"id": "c0a1-1", "name": "Acme Corp", "createdAt": 1, "updatedAt": 1},
            {"id": "c0a1-2", "name": "Globex", "createdAt": 2, "updatedAt": 2},
        ],
        "build": [],
    })
}

#[tokio::test]
async fn echo_returns_the_query_parameters() {
    let app = common::test_app(seed());

    let (status, payload) = app.get("/echo?foo=bar&count=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload, json!({"foo": "bar", "count": "3"}));
}

#[tokio::test]
async fn list_returns_raw_array_without_pagination_params() {
    let app = common::test_app(seed());

    let (status, payload) = app.get("/api/companies").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn list_wraps_paginated_requests_in_the_envelope() {
    let app = common::test_app(seed());

    let (status, payload) = app.get("/api/companies?_page=1&_limit=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["data"].as_array().unwrap().len(), 1);
    assert_eq!(payload["pagination"]["_page"], 1);
    assert_eq!(payload["pagination"]["_limit"], 1);
    assert_eq!(payload["pagination"]["_totalRows"], 2);

    // _limit alone also triggers the envelope
    let (_, payload) = app.get("/api/companies?_limit=10").await;
    assert_eq!(payload["pagination"]["_totalRows"], 2);

    // An absurd page number yields the empty page, not an error
    let (status, payload) = app
        .get("/api/companies?_page=9223372036854775807&_limit=10")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["data"], json!([]));
    assert_eq!(payload["pagination"]["_totalRows"], 2);
}

#[tokio::test]
async fn list_applies_equality_filters_from_query_params() {
    let app = common::test_app(seed());

    let (status, payload) = app.get("/api/companies?name=Globex").await;
    assert_eq!(status, StatusCode::OK);
    let rows = payload.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], "c0a1-2");

    let (_, payload) = app.get("/api/companies?name=Nonexistent").await;
    assert_eq!(payload, json!([]));
}

#[tokio::test]
async fn unknown_collections_are_404() {
    let app = common::test_app(seed());

    let (status, payload) = app.get("/api/widgets").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(payload["error"], "Collection 'widgets' not found");

    let (status, _) = app.get("/api/companies/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_resolves_numeric_and_string_ids() {
    let app = common::test_app(seed());

    let (status, user) = app.get("/api/users/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["fullName"], "Ada Deploy");

    let (status, company) = app.get("/api/companies/c0a1-2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(company["name"], "Globex");
}

#[tokio::test]
async fn post_assigns_ids_and_stamps_created_at() {
    let app = common::test_app(seed());

    // A brand new collection is created on first insert
    let (status, created) = app.post("/api/todos", json!({"title": "ship it"})).await;
    assert_eq!(status, StatusCode::CREATED, "payload: {}", created);
    assert_eq!(created["id"], 1);
    assert!(created["createdAt"].is_i64(), "middleware stamps createdAt");

    let (_, second) = app.post("/api/todos", json!({"title": "again"})).await;
    assert_eq!(second["id"], 2);

    // String-id collections get a uuid
    let (_, company) = app.post("/api/companies", json!({"name": "Initech"})).await;
    assert!(company["id"].as_str().is_some());

    // Duplicate explicit ids are rejected
    let (status, payload) = app.post("/api/todos", json!({"id": 1, "title": "dup"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "payload: {}", payload);
}

#[tokio::test]
async fn id_assignment_rejects_an_exhausted_numeric_space() {
    let app = common::test_app(seed());

    let (status, _) = app
        .post("/api/todos", json!({"id": i64::MAX, "title": "cap"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, payload) = app.post("/api/todos", json!({"title": "next"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["error"], "Numeric id space exhausted");
}

#[tokio::test]
async fn build_creation_resolves_the_acting_user() {
    let app = common::test_app(seed());

    let (status, payload) = app.post("/api/build", json!({"name": "Acme Tower"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["error"], "X-User-Id header is required");

    let (status, payload) = app
        .request("POST", "/api/build", Some(json!({"name": "Acme Tower"})), &[("X-User-Id", "99")])
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(payload["error"], "User not found");

    let (status, created) = app
        .request(
            "POST",
            "/api/build",
            Some(json!({"name": "Acme Tower", "mode": "edit", "collab": [], "staff": [], "dataTable": []})),
            &[("X-User-Id", "1")],
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "payload: {}", created);
    assert_eq!(created["createById"], 1);
    assert_eq!(created["createByName"], "Ada Deploy");
    assert!(created["createdAt"].is_i64());
}

#[tokio::test]
async fn put_replaces_and_patch_merges() {
    let app = common::test_app(seed());

    let (status, replaced) = app
        .put("/api/users/1", json!({"email": "new@example.com"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replaced["id"], 1, "id survives a replace");
    assert_eq!(replaced["email"], "new@example.com");
    assert!(replaced.get("fullName").is_none(), "replace drops old fields");

    let (status, patched) = app
        .patch("/api/users/1", json!({"fullName": "Grace Redeploy"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["email"], "new@example.com", "patch keeps other fields");
    assert_eq!(patched["fullName"], "Grace Redeploy");

    let (status, _) = app.put("/api/users/9", json!({"email": "x@y.z"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_the_record() {
    let app = common::test_app(seed());

    let (status, payload) = app.delete("/api/companies/c0a1-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload, json!({}));

    let (status, _) = app.get("/api/companies/c0a1-1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete("/api/companies/c0a1-1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mirror_collections_are_read_only_through_the_generic_router() {
    let app = common::test_app(json!({
        "build": [{"id": 1, "mode": "edit", "name": "B", "collab": [], "staff": [],
                   "dataTable": [{"id": 1, "note": "x"}]}],
        "dataTable1": [{"id": 1, "note": "x"}],
    }));

    // Readable like any collection, including pagination
    let (status, rows) = app.get("/api/dataTable1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows.as_array().unwrap().len(), 1);

    // But writes must go through the dataTable endpoints
    let (status, _) = app.post("/api/dataTable1", json!({"note": "sneak"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.delete("/api/dataTable1/1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
