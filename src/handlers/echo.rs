use std::collections::HashMap;

use axum::extract::Query;
use axum::response::Json;

/// GET /echo - Echo the query parameters back as a JSON object
pub async fn echo(Query(params): Query<HashMap<String, String>>) -> Json<HashMap<String, String>> {
    Json(params)
}
