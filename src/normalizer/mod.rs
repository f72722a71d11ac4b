//! Response normalization.
//!
//! The backend answers list endpoints with a bare array, `{data}`,
//! `{data: {data}}`, `{rows}` and several spellings of pagination metadata.
//! This module is the only place raw payload shapes are interpreted; every
//! other component works with [`ListResponse`].

use serde_json::{Map, Value};

use crate::domain::fields::{scalar_to_u64, is_truthy};
use crate::domain::{ListResponse, Pagination};

/// Paths tried, in order, to locate the item array.
const ARRAY_PATHS: &[&[&str]] = &[
    &["data"],
    &["rows"],
    &["result"],
    &["results"],
    &["items"],
    &["data", "data"],
    &["data", "rows"],
    &["data", "results"],
    &["data", "items"],
];

/// Paths tried, in order, to locate pagination metadata.
const PAGINATION_PATHS: &[&[&str]] = &[
    &["pagination"],
    &["pageInfo"],
    &["meta", "pagination"],
    &["data", "pagination"],
    &["data", "pageInfo"],
    &["data", "meta", "pagination"],
];

const TOTAL_KEYS: &[&str] = &["total", "totalItems", "total_items", "totalCount", "total_count", "count"];
const PAGE_KEYS: &[&str] = &["page", "currentPage", "current_page", "pageNumber", "page_number"];
const LIMIT_KEYS: &[&str] = &["limit", "perPage", "per_page", "pageSize", "page_size", "size"];
const TOTAL_PAGES_KEYS: &[&str] = &["totalPages", "total_pages", "pageCount", "page_count", "lastPage", "last_page"];
const HAS_NEXT_KEYS: &[&str] = &["hasNextPage", "has_next_page", "hasNext", "has_next", "hasMore", "has_more"];
const HAS_PREV_KEYS: &[&str] = &["hasPreviousPage", "has_previous_page", "hasPrevPage", "hasPrev", "has_prev"];

/// Page and limit the caller asked for; used when the server's metadata omits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

/// The shapes a decoded payload can take.
enum Payload<'a> {
    Sequence(&'a [Value]),
    Envelope(&'a Map<String, Value>),
    Other,
}

impl<'a> Payload<'a> {
    fn classify(value: &'a Value) -> Self {
        match value {
            Value::Array(items) => Payload::Sequence(items),
            Value::Object(map) => Payload::Envelope(map),
            _ => Payload::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a list payload. Pure and total: never fails.
    pub fn normalize(&self, payload: &Value) -> ListResponse<Value> {
        self.normalize_page(payload, None)
    }

    /// Normalize a list payload, falling back to `request` for page/limit
    /// when the server's pagination block omits them.
    pub fn normalize_page(&self, payload: &Value, request: Option<PageRequest>) -> ListResponse<Value> {
        match Payload::classify(payload) {
            Payload::Sequence(items) => ListResponse {
                success: true,
                message: None,
                data: items.to_vec(),
                pagination: Pagination::single_page(items.len()),
            },
            Payload::Envelope(map) => {
                let data = extract_array(map);
                let pagination = match extract_pagination(map) {
                    Some(meta) => read_pagination(meta, data.len(), request),
                    None => Pagination::single_page(data.len()),
                };

                ListResponse {
                    success: map.get("success").and_then(Value::as_bool).unwrap_or(true),
                    message: map.get("message").and_then(Value::as_str).map(String::from),
                    data,
                    pagination,
                }
            }
            Payload::Other => ListResponse {
                success: true,
                message: None,
                data: Vec::new(),
                pagination: Pagination::single_page(0),
            },
        }
    }

    /// Extract the record from a detail payload: `{data: {…}}`, `{data: [x]}`,
    /// `{item: {…}}`, `{result: {…}}` or the bare object.
    pub fn unwrap_record(&self, payload: &Value) -> Option<Value> {
        match Payload::classify(payload) {
            Payload::Sequence(items) => items.first().filter(|v| v.is_object()).cloned(),
            // A record carrying its own id is never unwrapped further
            Payload::Envelope(map) if map.contains_key("id") => Some(payload.clone()),
            Payload::Envelope(map) => {
                for key in ["data", "item", "result"] {
                    match map.get(key) {
                        Some(inner @ Value::Object(_)) => {
                            return self.unwrap_record(inner).or_else(|| Some(inner.clone()));
                        }
                        Some(Value::Array(items)) if key == "data" => {
                            return items.first().filter(|v| v.is_object()).cloned();
                        }
                        _ => {}
                    }
                }
                // An envelope with nothing but status fields carries no record.
                let only_status = map
                    .keys()
                    .all(|k| matches!(k.as_str(), "success" | "message" | "error" | "status"));
                if only_status {
                    None
                } else {
                    Some(payload.clone())
                }
            }
            Payload::Other => None,
        }
    }
}

fn lookup<'a>(map: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = map.get(*first)?;
    for key in rest {
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

fn extract_array(map: &Map<String, Value>) -> Vec<Value> {
    ARRAY_PATHS
        .iter()
        .find_map(|path| lookup(map, path).and_then(Value::as_array))
        .cloned()
        .unwrap_or_default()
}

fn extract_pagination(map: &Map<String, Value>) -> Option<&Map<String, Value>> {
    PAGINATION_PATHS
        .iter()
        .find_map(|path| lookup(map, path).and_then(Value::as_object))
}

fn field<'a>(meta: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| meta.get(*k).filter(|v| !v.is_null()))
}

fn number(meta: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    field(meta, keys).and_then(scalar_to_u64)
}

fn boolean(meta: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    match field(meta, keys)? {
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        v @ (Value::Bool(_) | Value::Number(_)) => Some(is_truthy(v)),
        _ => None,
    }
}

fn read_pagination(meta: &Map<String, Value>, len: usize, request: Option<PageRequest>) -> Pagination {
    let total = number(meta, TOTAL_KEYS).unwrap_or(len as u64);
    let page = number(meta, PAGE_KEYS)
        .or(request.map(|r| r.page))
        .unwrap_or(1)
        .max(1);
    let limit = number(meta, LIMIT_KEYS)
        .or(request.map(|r| r.limit))
        .unwrap_or_else(|| total.max(1))
        .max(1);
    let total_pages = number(meta, TOTAL_PAGES_KEYS).unwrap_or_else(|| total.div_ceil(limit));

    Pagination {
        total,
        page,
        limit,
        total_pages,
        has_next_page: boolean(meta, HAS_NEXT_KEYS).unwrap_or(page < total_pages),
        has_previous_page: boolean(meta, HAS_PREV_KEYS).unwrap_or(page > 1),
    }
}
