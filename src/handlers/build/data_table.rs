//! Nested `dataTable` maintenance on a build, kept in lockstep with the
//! build's mirror table.
//!
//! Each operation rewrites the build's embedded array and the keyed
//! mirror inside one `try_write` closure, so the two representations
//! commit (and persist) together or not at all.

use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::error::ApiError;
use crate::state::AppState;
use crate::store::Database;

/// POST /api/build/:buildId/dataTable - Append a new entry
///
/// The new entry takes id `max(existing)+1` (1 when the table is empty)
/// and is prepended, keeping most-recent-first order. The mirror table is
/// created or fully replaced with the resulting array.
pub async fn data_table_create(
    State(state): State<AppState>,
    Path(build_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let build_id = parse_id(&build_id, "buildId")?;
    let body = object_body(payload)?;

    let entry = state.store.try_write(|db| -> Result<Value, ApiError> {
        let (pos, mut rows) = build_rows(db, build_id)?;

        // The enrichment middleware stamps createdAt on every POST body,
        // so it doesn't count towards the payload being non-empty. Checked
        // after the build lookup: an unknown build is a 404 regardless of
        // the body.
        if body.keys().all(|key| key == "createdAt") {
            return Err(ApiError::bad_request("Request body must not be empty"));
        }

        let now = Utc::now().timestamp_millis();
        let next_id = rows
            .iter()
            .filter_map(|entry| entry.get("id").and_then(Value::as_i64))
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| ApiError::bad_request("Data table id space exhausted"))?;

        let mut entry = body.clone();
        entry.insert("id".to_string(), json!(next_id));
        entry.entry("createdAt".to_string()).or_insert(json!(now));
        entry.insert("updatedAt".to_string(), json!(now));
        let entry = Value::Object(entry);

        rows.insert(0, entry.clone());
        write_build_rows(db, pos, rows.clone());
        db.set_data_table(build_id, rows);

        Ok(entry)
    })??;

    Ok(Json(json!({
        "message": "Data table entry created",
        "data": entry,
    })))
}

/// PUT /api/build/:buildId/dataTable/:dataTableId - Merge fields over an
/// existing entry
///
/// Requires the mirror table to exist already, even when the build does;
/// an entry present in the build but absent from the mirror is reported
/// as an inconsistency rather than papered over.
pub async fn data_table_update(
    State(state): State<AppState>,
    Path((build_id, entry_id)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let build_id = parse_id(&build_id, "buildId")?;
    let entry_id = parse_id(&entry_id, "dataTableId")?;
    let body = object_body(payload)?;

    let merged = state.store.try_write(|db| -> Result<Value, ApiError> {
        let (pos, mut rows) = build_rows(db, build_id)?;

        if !db.has_data_table(build_id) {
            return Err(ApiError::not_found(format!(
                "Data table for build {} not found",
                build_id
            )));
        }

        let idx = entry_position(&rows, entry_id)?;

        if body.is_empty() {
            return Err(ApiError::bad_request("Request body must not be empty"));
        }

        let mut merged = match &rows[idx] {
            Value::Object(existing) => existing.clone(),
            _ => Map::new(),
        };
        for (key, value) in &body {
            if key != "id" {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged.insert("updatedAt".to_string(), json!(Utc::now().timestamp_millis()));
        let merged = Value::Object(merged);

        rows[idx] = merged.clone();
        write_build_rows(db, pos, rows);

        let mirror = db
            .data_table_mut(build_id)
            .expect("mirror checked above under the same lock");
        let mirror_idx = mirror
            .iter()
            .position(|entry| entry.get("id").and_then(Value::as_i64) == Some(entry_id))
            .ok_or_else(|| {
                ApiError::not_found(format!(
                    "Data table entry {} missing from the mirror for build {}",
                    entry_id, build_id
                ))
            })?;
        mirror[mirror_idx] = merged.clone();

        Ok(merged)
    })??;

    Ok(Json(json!({
        "message": "Data table entry updated",
        "data": merged,
    })))
}

/// DELETE /api/build/:buildId/dataTable/:dataTableId - Remove an entry
///
/// Relative order of the remaining entries is preserved. The mirror is
/// rewritten only when it already exists; delete never creates it.
pub async fn data_table_delete(
    State(state): State<AppState>,
    Path((build_id, entry_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let build_id = parse_id(&build_id, "buildId")?;
    let entry_id = parse_id(&entry_id, "dataTableId")?;

    state.store.try_write(|db| -> Result<(), ApiError> {
        let (pos, mut rows) = build_rows(db, build_id)?;
        let idx = entry_position(&rows, entry_id)?;

        rows.remove(idx);
        write_build_rows(db, pos, rows.clone());
        if db.has_data_table(build_id) {
            db.set_data_table(build_id, rows);
        }
        Ok(())
    })??;

    Ok(Json(json!({
        "message": "Data table entry deleted",
        "data": { "id": entry_id },
    })))
}

fn parse_id(raw: &str, param_name: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("{} must be a number", param_name)))
}

fn object_body(payload: Value) -> Result<Map<String, Value>, ApiError> {
    match payload {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::bad_request("Request body must be a JSON object")),
    }
}

/// Locate a build by id and clone its `dataTable` array (empty when the
/// field is missing or not an array).
fn build_rows(db: &Database, build_id: i64) -> Result<(usize, Vec<Value>), ApiError> {
    let raw = build_id.to_string();
    let pos = db
        .find_position("build", &raw)
        .ok_or_else(|| ApiError::not_found(format!("Build {} not found", build_id)))?;
    let rows = db
        .find_record("build", &raw)
        .and_then(|build| build.get("dataTable"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    Ok((pos, rows))
}

fn write_build_rows(db: &mut Database, pos: usize, rows: Vec<Value>) {
    if let Some(builds) = db.collection_mut("build") {
        if let Some(build) = builds.get_mut(pos) {
            build["dataTable"] = Value::Array(rows);
        }
    }
}

fn entry_position(rows: &[Value], entry_id: i64) -> Result<usize, ApiError> {
    rows.iter()
        .position(|entry| entry.get("id").and_then(Value::as_i64) == Some(entry_id))
        .ok_or_else(|| ApiError::not_found(format!("Data table entry {} not found", entry_id)))
}
