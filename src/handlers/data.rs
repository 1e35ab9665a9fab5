//! Generic collection CRUD under `/api/:collection`.
//!
//! This is the fall-through router behind the bespoke build endpoints.
//! Mirror tables (`dataTable<N>`) are readable through it but only the
//! dataTable endpoints may write them.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::pagination::{paginate, resolve_raw};
use crate::state::AppState;
use crate::store::{mirror_table_id, record_id_matches, Database};

/// GET /api/:collection - List records, optionally filtered and paginated
///
/// Query params that don't start with `_` are exact-match field filters.
/// When `_page` or `_limit` is present the result carries a total count
/// and the reply is wrapped in the `{data, pagination}` envelope;
/// otherwise the raw array is returned.
pub async fn list(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let rows = state
        .store
        .read(|db| db.collection(&collection).cloned())
        .ok_or_else(|| collection_not_found(&collection))?;

    let filters: Vec<(&String, &String)> =
        params.iter().filter(|(key, _)| !key.starts_with('_')).collect();

    let filtered: Vec<Value> = rows
        .into_iter()
        .filter(|row| {
            filters
                .iter()
                .all(|(key, value)| field_matches(row.get(key.as_str()), value.as_str()))
        })
        .collect();

    if params.contains_key("_page") || params.contains_key("_limit") {
        let (page, limit) = resolve_raw(
            params.get("_page").map(String::as_str),
            params.get("_limit").map(String::as_str),
        );
        Ok(Json(paginate(filtered, page, limit)).into_response())
    } else {
        Ok(Json(Value::Array(filtered)).into_response())
    }
}

/// GET /api/:collection/:id - Get a single record by id
pub async fn get(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    state
        .store
        .read(|db| {
            if !db.has_collection(&collection) {
                return Err(collection_not_found(&collection));
            }
            db.find_record(&collection, &id)
                .cloned()
                .ok_or_else(|| record_not_found(&collection, &id))
        })
        .map(Json)
}

/// POST /api/:collection - Create a record
///
/// The body arrives already stamped by the enrichment middleware. A
/// missing `id` is assigned: numeric max+1 in collections with numeric
/// ids, a fresh uuid otherwise. Posting to an unknown collection creates
/// it.
pub async fn create(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    reject_mirror_writes(&collection)?;

    let mut record = match payload {
        Value::Object(map) => map,
        _ => return Err(ApiError::bad_request("Request body must be a JSON object")),
    };

    let created = state.store.try_write(|db| -> Result<Value, ApiError> {
        let rows = db.collection_entry(&collection);

        match record.get("id") {
            Some(id) => {
                let raw = id_as_string(id);
                if rows.iter().any(|row| record_id_matches(row, &raw)) {
                    return Err(ApiError::bad_request(format!(
                        "Record '{}' already exists in '{}'",
                        raw, collection
                    )));
                }
            }
            None => {
                record.insert("id".to_string(), next_id(rows)?);
            }
        }

        let created = Value::Object(record);
        rows.push(created.clone());
        Ok(created)
    })??;

    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/:collection/:id - Replace a record, keeping its id
pub async fn replace(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    reject_mirror_writes(&collection)?;

    let body = match payload {
        Value::Object(map) => map,
        _ => return Err(ApiError::bad_request("Request body must be a JSON object")),
    };

    let updated = state.store.try_write(|db| -> Result<Value, ApiError> {
        let (pos, old_id) = locate(db, &collection, &id)?;

        let mut replacement = body.clone();
        replacement.insert("id".to_string(), old_id);
        let replacement = Value::Object(replacement);

        if let Some(rows) = db.collection_mut(&collection) {
            rows[pos] = replacement.clone();
        }
        Ok(replacement)
    })??;

    Ok(Json(updated))
}

/// PATCH /api/:collection/:id - Shallow-merge fields over a record
pub async fn patch(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    reject_mirror_writes(&collection)?;

    let body = match payload {
        Value::Object(map) => map,
        _ => return Err(ApiError::bad_request("Request body must be a JSON object")),
    };

    let updated = state.store.try_write(|db| -> Result<Value, ApiError> {
        let (pos, old_id) = locate(db, &collection, &id)?;

        let rows = match db.collection_mut(&collection) {
            Some(rows) => rows,
            None => return Err(collection_not_found(&collection)),
        };

        if let Value::Object(target) = &mut rows[pos] {
            for (key, value) in &body {
                target.insert(key.clone(), value.clone());
            }
            target.insert("id".to_string(), old_id);
        }
        Ok(rows[pos].clone())
    })??;

    Ok(Json(updated))
}

/// DELETE /api/:collection/:id - Remove a record
pub async fn delete(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    reject_mirror_writes(&collection)?;

    state.store.try_write(|db| -> Result<(), ApiError> {
        let (pos, _) = locate(db, &collection, &id)?;
        if let Some(rows) = db.collection_mut(&collection) {
            rows.remove(pos);
        }
        Ok(())
    })??;

    Ok(Json(json!({})))
}

fn locate(db: &Database, collection: &str, id: &str) -> Result<(usize, Value), ApiError> {
    if !db.has_collection(collection) {
        return Err(collection_not_found(collection));
    }
    let pos = db
        .find_position(collection, id)
        .ok_or_else(|| record_not_found(collection, id))?;
    let old_id = db
        .find_record(collection, id)
        .and_then(|record| record.get("id").cloned())
        .unwrap_or(Value::Null);
    Ok((pos, old_id))
}

fn collection_not_found(collection: &str) -> ApiError {
    ApiError::not_found(format!("Collection '{}' not found", collection))
}

fn record_not_found(collection: &str, id: &str) -> ApiError {
    ApiError::not_found(format!("Record '{}' not found in '{}'", id, collection))
}

fn reject_mirror_writes(collection: &str) -> Result<(), ApiError> {
    if mirror_table_id(collection).is_some() {
        return Err(ApiError::bad_request(
            "dataTable collections are managed via /api/build/:buildId/dataTable",
        ));
    }
    Ok(())
}

/// Exact-match comparison of a record field against a raw query value.
fn field_matches(field: Option<&Value>, raw: &str) -> bool {
    match field {
        Some(Value::String(s)) => s == raw,
        Some(Value::Number(n)) => n.to_string() == raw,
        Some(Value::Bool(b)) => b.to_string() == raw,
        _ => false,
    }
}

fn id_as_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Next id for a collection: numeric max+1 when the collection uses
/// numeric ids (or is empty), a fresh uuid when it uses string ids.
/// A collection whose max id is already `i64::MAX` cannot take another
/// numeric id.
fn next_id(rows: &[Value]) -> Result<Value, ApiError> {
    let numeric_ids: Vec<i64> = rows
        .iter()
        .filter_map(|row| row.get("id").and_then(Value::as_i64))
        .collect();

    if numeric_ids.len() == rows.len() {
        let next = numeric_ids
            .iter()
            .max()
            .copied()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| ApiError::bad_request("Numeric id space exhausted"))?;
        Ok(json!(next))
    } else {
        Ok(json!(Uuid::new_v4().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_id_increments_numeric_collections() {
        let rows = vec![json!({"id": 3}), json!({"id": 7})];
        assert_eq!(next_id(&rows).unwrap(), json!(8));
        assert_eq!(next_id(&[]).unwrap(), json!(1));
    }

    #[test]
    fn next_id_uses_uuid_for_string_collections() {
        let rows = vec![json!({"id": "a-b-c"})];
        let id = next_id(&rows).unwrap();
        assert!(id.as_str().is_some());
    }

    #[test]
    fn next_id_rejects_an_exhausted_id_space() {
        let rows = vec![json!({"id": i64::MAX})];
        assert!(next_id(&rows).is_err());
    }

    #[test]
    fn field_match_covers_scalar_types() {
        assert!(field_matches(Some(&json!("x")), "x"));
        assert!(field_matches(Some(&json!(12)), "12"));
        assert!(field_matches(Some(&json!(true)), "true"));
        assert!(!field_matches(Some(&json!({"nested": 1})), "1"));
        assert!(!field_matches(None, "1"));
    }
}
