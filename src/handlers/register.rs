//! Account registration.
//!
//! The only supported way to mint a `users` record with a verifiable
//! password hash; posting to `/api/users` through the generic router
//! would store the raw password and never pass verification.

use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::task;

use crate::auth::hash_password;
use crate::error::ApiError;
use crate::state::AppState;

use super::password::non_empty;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "fullName")]
    pub full_name: Option<String>,
}

/// POST /api/register - Create a user account with a hashed password
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (email, password) = match (non_empty(request.email), non_empty(request.password)) {
        (Some(email), Some(password)) => (email, password),
        _ => return Err(ApiError::bad_request("Email and password are required")),
    };

    let hash = task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::internal_server_error(format!("hash computation failed: {}", e)))?;

    let created = state.store.try_write(|db| -> Result<Value, ApiError> {
        let users = db.collection_entry("users");

        if users
            .iter()
            .any(|user| user.get("email").and_then(Value::as_str) == Some(email.as_str()))
        {
            return Err(ApiError::bad_request("Email already exists"));
        }

        let id = users
            .iter()
            .filter_map(|user| user.get("id").and_then(Value::as_i64))
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| ApiError::bad_request("Numeric id space exhausted"))?;

        let now = Utc::now().timestamp_millis();
        let mut user = Map::new();
        user.insert("id".to_string(), json!(id));
        user.insert("email".to_string(), json!(email));
        user.insert("password".to_string(), json!(hash));
        user.insert(
            "fullName".to_string(),
            request.full_name.map(Value::String).unwrap_or(Value::Null),
        );
        user.insert("createdAt".to_string(), json!(now));
        user.insert("updatedAt".to_string(), json!(now));
        let user = Value::Object(user);

        users.push(user.clone());
        Ok(user)
    })??;

    // The stored hash never leaves the store.
    let mut public = created;
    if let Value::Object(user) = &mut public {
        user.remove("password");
    }

    Ok((StatusCode::CREATED, Json(public)))
}
