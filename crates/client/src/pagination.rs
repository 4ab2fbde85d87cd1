use serde::Serialize;
use serde_json::Value;

use crate::request::ApiResponse;

/// Page size the store applies when `per_page` is omitted.
pub const DEFAULT_PER_PAGE: u32 = 30;
pub const MAX_PER_PAGE: u32 = 200;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    pub has_next: bool,
    pub has_prev: bool,
}

/// A list response with its pagination metadata made explicit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page {
    pub data: Value,
    pub pagination: Pagination,
}

impl Page {
    pub fn from_response(response: ApiResponse, page: Option<u32>, per_page: Option<u32>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        let total = response.meta.total_count;
        let link = response.meta.link.as_deref();

        let returned = match &response.body {
            Value::Array(items) => items.len() as u64,
            Value::Null => 0,
            _ => 1,
        };

        let has_next = if let Some(link) = link {
            has_rel(link, "next")
        } else if let Some(total) = total {
            u64::from(page) * u64::from(per_page) < total
        } else {
            returned >= u64::from(per_page)
        };
        let has_prev = match link {
            Some(link) if has_rel(link, "prev") => true,
            _ => page > 1,
        };

        Self {
            data: response.body,
            pagination: Pagination { page, per_page, total, has_next, has_prev },
        }
    }

    pub fn into_value(self) -> Value {
        serde_json::to_value(&self).unwrap_or(self.data)
    }
}

fn has_rel(link: &str, rel: &str) -> bool {
    let needle = format!("rel=\"{rel}\"");
    link.split(',').any(|part| part.contains(&needle))
}
