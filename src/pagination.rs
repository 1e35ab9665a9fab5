//! `_page`/`_limit` parsing and the `{data, pagination}` list envelope.

use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// Resolve raw `_page`/`_limit` query values. Anything missing,
/// non-numeric, zero or negative falls back to the defaults.
pub fn resolve_raw(page: Option<&str>, limit: Option<&str>) -> (i64, i64) {
    let parse = |raw: Option<&str>, default: i64| {
        raw.and_then(|s| s.parse::<i64>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(default)
    };
    (parse(page, DEFAULT_PAGE), parse(limit, DEFAULT_LIMIT))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    #[serde(rename = "_page")]
    pub page: i64,
    #[serde(rename = "_limit")]
    pub limit: i64,
    #[serde(rename = "_totalRows")]
    pub total_rows: i64,
}

#[derive(Debug, Serialize)]
pub struct PageEnvelope {
    pub data: Vec<Value>,
    pub pagination: Pagination,
}

/// Slice `[(page-1)*limit, page*limit)` out of the filtered set, with the
/// total count of the unsliced set in the envelope.
///
/// Arithmetic saturates: an absurdly large page number yields the empty
/// page, never a panic.
pub fn paginate(items: Vec<Value>, page: i64, limit: i64) -> PageEnvelope {
    let total_rows = items.len() as i64;
    let start = page.saturating_sub(1).saturating_mul(limit).clamp(0, total_rows) as usize;
    let end = page.saturating_mul(limit).clamp(start as i64, total_rows) as usize;

    PageEnvelope {
        data: items[start..end].to_vec(),
        pagination: Pagination {
            page,
            limit,
            total_rows,
        },
    }
}
