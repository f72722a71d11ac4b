use serde::{Deserialize, Serialize};

/// Canonical pagination metadata. Always fully populated by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl Pagination {
    /// Pagination for a response that carried none: one page holding everything.
    pub fn single_page(len: usize) -> Self {
        let total = len as u64;
        Self {
            total,
            page: 1,
            limit: total.max(1),
            total_pages: if total > 0 { 1 } else { 0 },
            has_next_page: false,
            has_previous_page: false,
        }
    }
}

/// One page of a list endpoint in canonical shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Vec<T>,
    pub pagination: Pagination,
}
