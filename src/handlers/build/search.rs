//! Build search by embedded collaborator or staff id.
//!
//! The two endpoints are identical apart from which embedded list and
//! path parameter they inspect. Builds are filtered in storage order,
//! then the requested page is sliced out.

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::pagination::{paginate, resolve_raw, PageEnvelope};
use crate::state::AppState;

/// Build modes eligible for search. Both endpoints apply the same check;
/// anything else (archived, draft) stays out of the results.
const VALID_MODES: [&str; 2] = ["user", "edit"];

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(rename = "keySearch")]
    pub key_search: Option<String>,
    #[serde(rename = "_page")]
    pub page: Option<String>,
    #[serde(rename = "_limit")]
    pub limit: Option<String>,
}

/// GET /api/build/collab/:collabId - Builds containing a collaborator
pub async fn collab_search(
    State(state): State<AppState>,
    Path(collab_id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<PageEnvelope>, ApiError> {
    search(&state, "collab", "collabId", &collab_id, query)
}

/// GET /api/build/staff/:staffId - Builds containing a staff member
pub async fn staff_search(
    State(state): State<AppState>,
    Path(staff_id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<PageEnvelope>, ApiError> {
    search(&state, "staff", "staffId", &staff_id, query)
}

fn search(
    state: &AppState,
    list_field: &str,
    param_name: &str,
    raw_id: &str,
    query: SearchQuery,
) -> Result<Json<PageEnvelope>, ApiError> {
    let member_id: i64 = raw_id
        .parse()
        .map_err(|_| ApiError::bad_request(format!("{} must be a number", param_name)))?;

    // Missing collection means no builds yet, not an error.
    let builds = state
        .store
        .read(|db| db.collection("build").cloned())
        .unwrap_or_default();

    let needle = query.key_search.as_deref().map(str::to_lowercase);

    let filtered: Vec<Value> = builds
        .into_iter()
        .filter(|build| {
            mode_is_searchable(build)
                && contains_member(build.get(list_field), member_id)
                && name_matches(build, needle.as_deref())
        })
        .collect();

    let (page, limit) = resolve_raw(query.page.as_deref(), query.limit.as_deref());
    Ok(Json(paginate(filtered, page, limit)))
}

fn mode_is_searchable(build: &Value) -> bool {
    build
        .get("mode")
        .and_then(Value::as_str)
        .map(|mode| VALID_MODES.contains(&mode))
        .unwrap_or(false)
}

/// Does the embedded `{id, ...}` list contain the requested member?
fn contains_member(list: Option<&Value>, member_id: i64) -> bool {
    list.and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .any(|entry| entry.get("id").and_then(Value::as_i64) == Some(member_id))
        })
        .unwrap_or(false)
}

/// Case-insensitive substring match against the build name. No needle
/// means no constraint.
fn name_matches(build: &Value, needle: Option<&str>) -> bool {
    match needle {
        None => true,
        Some(needle) => build
            .get("name")
            .and_then(Value::as_str)
            .map(|name| name.to_lowercase().contains(needle))
            .unwrap_or(false),
    }
}
