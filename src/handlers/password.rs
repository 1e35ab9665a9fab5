//! Password change flow.

use axum::{extract::State, response::Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::task;

use crate::auth::{hash_password, verify_password};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub email: Option<String>,
    #[serde(rename = "oldPassword")]
    pub old_password: Option<String>,
    #[serde(rename = "newPassword")]
    pub new_password: Option<String>,
}

/// PUT /api/change-password - Verify the current password and store a new hash
pub async fn change_password(
    State(state): State<AppState>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    let (email, old_password, new_password) = match (
        non_empty(request.email),
        non_empty(request.old_password),
        non_empty(request.new_password),
    ) {
        (Some(email), Some(old), Some(new)) => (email, old, new),
        _ => {
            return Err(ApiError::bad_request(
                "Email, current password, and new password are required",
            ))
        }
    };

    let user = state
        .store
        .read(|db| find_user(db.collection("users"), &email))
        .ok_or_else(|| ApiError::not_found("Account does not exist"))?;

    let stored_hash = user
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    // Hashing is the one operation that suspends; everything else is
    // synchronous against the store.
    let matches = task::spawn_blocking(move || verify_password(&old_password, &stored_hash))
        .await
        .map_err(|e| ApiError::internal_server_error(format!("hash verification failed: {}", e)))?;
    if !matches {
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    let new_hash = task::spawn_blocking(move || hash_password(&new_password))
        .await
        .map_err(|e| ApiError::internal_server_error(format!("hash computation failed: {}", e)))?;

    state.store.try_write(|db| -> Result<(), ApiError> {
        let users = db
            .collection_mut("users")
            .ok_or_else(|| ApiError::not_found("Account does not exist"))?;
        let user = users
            .iter_mut()
            .find(|user| user.get("email").and_then(Value::as_str) == Some(email.as_str()))
            .ok_or_else(|| ApiError::not_found("Account does not exist"))?;

        user["password"] = json!(new_hash);
        user["updatedAt"] = json!(Utc::now().timestamp_millis());
        Ok(())
    })??;

    Ok(Json(json!({ "message": "Password changed successfully" })))
}

pub(crate) fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.trim().is_empty())
}

fn find_user(users: Option<&Vec<Value>>, email: &str) -> Option<Value> {
    users?
        .iter()
        .find(|user| user.get("email").and_then(Value::as_str) == Some(email))
        .cloned()
}
