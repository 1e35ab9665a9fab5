//! POST enrichment middleware.
//!
//! Every POST body gets a `createdAt` timestamp before it reaches any
//! handler. Build creation (`POST /api/build`) additionally resolves the
//! acting user from the `X-User-Id` header and stamps `createById` and
//! `createByName` onto the body.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::error::ApiError;
use crate::state::AppState;

const BODY_LIMIT: usize = 2 * 1024 * 1024;

pub async fn enrich_post(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() != Method::POST {
        return Ok(next.run(request).await);
    }

    let (mut parts, body) = request.into_parts();
    let bytes = to_bytes(body, BODY_LIMIT)
        .await
        .map_err(|e| ApiError::bad_request(format!("failed to read request body: {}", e)))?;

    // An absent body counts as an empty object. Malformed JSON is left
    // for the handler's extractor to reject.
    let mut payload: Value = if bytes.is_empty() {
        Value::Object(Map::new())
    } else {
        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(_) => {
                let request = Request::from_parts(parts, Body::from(bytes));
                return Ok(next.run(request).await);
            }
        }
    };

    if let Value::Object(map) = &mut payload {
        map.insert("createdAt".to_string(), json!(Utc::now().timestamp_millis()));

        if parts.uri.path() == "/api/build" {
            let user_id = parts
                .headers
                .get("x-user-id")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ApiError::bad_request("X-User-Id header is required"))?
                .to_string();

            let user = state
                .store
                .read(|db| db.find_record("users", &user_id).cloned())
                .ok_or_else(|| ApiError::not_found("User not found"))?;

            map.insert("createById".to_string(), user["id"].clone());
            map.insert(
                "createByName".to_string(),
                user.get("fullName").cloned().unwrap_or(Value::Null),
            );
        }
    }

    // The body changed, so the incoming framing headers no longer apply.
    let bytes = serde_json::to_vec(&payload)
        .map_err(|e| ApiError::internal_server_error(format!("failed to rebuild body: {}", e)))?;
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}
