use crate::store::Record;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PER_PAGE: usize = 10;

/// The list endpoint's response envelope.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListRecordsResponse {
    pub page: usize,
    pub pages: usize,
    pub per_page: usize,
    pub records: Vec<Record>,
    pub total: usize,
}

/// `page`/`perPage` query parameters. Values that don't parse as a positive integer fall back
/// to the defaults rather than failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Paging {
    pub page: usize,
    pub per_page: usize,
}

impl Default for Paging {
    fn default() -> Self {
        Paging {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl From<&HashMap<String, String>> for Paging {
    fn from(query: &HashMap<String, String>) -> Self {
        let positive = |key: &str| {
            query
                .get(key)
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|v| *v > 0)
        };
        Paging {
            page: positive("page").unwrap_or(DEFAULT_PAGE),
            per_page: positive("perPage").unwrap_or(DEFAULT_PER_PAGE),
        }
    }
}

impl Paging {
    /// Build the envelope for the half-open window `[(page-1)*perPage, page*perPage)` of
    /// `records`, clamped to the records available.
    pub fn window(self, records: &[Record]) -> ListRecordsResponse {
        let total = records.len();
        let start = self.page.saturating_sub(1).saturating_mul(self.per_page).min(total);
        let end = self.page.saturating_mul(self.per_page).min(total);
        ListRecordsResponse {
            page: self.page,
            pages: total.div_ceil(self.per_page),
            per_page: self.per_page,
            records: records[start..end].to_vec(),
            total,
        }
    }
}

/// Error body mirroring the upstream directory API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
    pub details: Vec<ErrorDetail>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    #[serde(rename = "@type")]
    pub type_url: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub serving_data: String,
}

impl ErrorResponse {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        ErrorResponse {
            code,
            message: message.into(),
            details: vec![ErrorDetail {
                type_url: "type.googleapis.com/google.rpc.RequestInfo".to_string(),
                request_id: "00000000-0000-0000-0000-000000000000".to_string(),
                serving_data: String::new(),
            }],
        }
    }
}
